//! In-memory buffer of structured log entries, drained into each
//! usage payload.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
    Debug,
}

/// One buffered log line: a closed record plus one open metadata map,
/// flattened into the serialized object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: i64,
    pub level: LogLevel,
    pub message: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Mutex-guarded append-only buffer. The axum runtime handles requests
/// in parallel, so unlike a cooperative single-threaded runtime this
/// buffer needs real synchronization.
pub struct LogBuffer {
    enabled: bool,
    entries: Mutex<Vec<LogEntry>>,
}

impl LogBuffer {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Append an entry with a wall-clock timestamp. No-op when the
    /// analytics kill-switch is set.
    pub fn record(&self, level: LogLevel, message: impl Into<String>, fields: Map<String, Value>) {
        if !self.enabled {
            return;
        }

        let entry = LogEntry {
            timestamp: chrono::Utc::now().timestamp_millis(),
            level,
            message: message.into(),
            fields,
        };

        // A panicking holder poisons the lock but leaves the entries
        // intact; analytics must not panic in turn
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(entry);
    }

    pub fn info(&self, message: impl Into<String>, fields: Map<String, Value>) {
        self.record(LogLevel::Info, message, fields);
    }

    pub fn warn(&self, message: impl Into<String>, fields: Map<String, Value>) {
        self.record(LogLevel::Warning, message, fields);
    }

    pub fn error(&self, message: impl Into<String>, fields: Map<String, Value>) {
        self.record(LogLevel::Error, message, fields);
    }

    pub fn debug(&self, message: impl Into<String>, fields: Map<String, Value>) {
        self.record(LogLevel::Debug, message, fields);
    }

    /// Read and atomically clear the buffer, preserving insertion order.
    pub fn drain(&self) -> Vec<LogEntry> {
        std::mem::take(&mut *self.entries.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(key: &str, value: &str) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(key.to_string(), Value::String(value.to_string()));
        map
    }

    #[test]
    fn test_record_and_drain_preserves_order() {
        let buffer = LogBuffer::new(true);
        buffer.info("first", Map::new());
        buffer.warn("second", fields("tone", "formal"));
        buffer.error("third", Map::new());

        let entries = buffer.drain();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].message, "first");
        assert_eq!(entries[1].level, LogLevel::Warning);
        assert_eq!(entries[1].fields["tone"], "formal");
        assert_eq!(entries[2].message, "third");
    }

    #[test]
    fn test_drain_once_semantics() {
        let buffer = LogBuffer::new(true);
        buffer.debug("only", Map::new());

        assert_eq!(buffer.drain().len(), 1);
        assert!(buffer.drain().is_empty());
    }

    #[test]
    fn test_disabled_buffer_records_nothing() {
        let buffer = LogBuffer::new(false);
        buffer.info("dropped", Map::new());

        assert!(buffer.drain().is_empty());
    }

    #[test]
    fn test_recovers_from_poisoned_lock() {
        let buffer = std::sync::Arc::new(LogBuffer::new(true));
        buffer.info("before", Map::new());

        let poisoner = std::sync::Arc::clone(&buffer);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.entries.lock().unwrap();
            panic!("holder dies with the lock");
        })
        .join();

        // Both operations must keep working on the poisoned mutex
        buffer.info("after", Map::new());
        let entries = buffer.drain();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].message, "after");
    }

    #[test]
    fn test_entry_serializes_flat_fields() {
        let entry = LogEntry {
            timestamp: 1700000000000,
            level: LogLevel::Info,
            message: "paraphrase".to_string(),
            fields: fields("tone", "concise"),
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["level"], "INFO");
        assert_eq!(json["tone"], "concise");
        assert!(json.get("fields").is_none());
    }
}
