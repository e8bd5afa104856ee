use serde::{Deserialize, Serialize};

/// Inbound paraphrase request body
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ParaphraseRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub tone: Option<String>,
    /// Optional override of the configured delivery mode.
    #[serde(default)]
    pub stream: Option<bool>,
}

/// Buffered success response: a single rewrite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParaphraseResult {
    pub result: String,
}

/// Buffered success response: five discrete humanize variants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParaphraseOptions {
    pub options: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_tolerates_missing_fields() {
        let request: ParaphraseRequest = serde_json::from_str("{}").unwrap();
        assert!(request.text.is_none());
        assert!(request.tone.is_none());
        assert!(request.stream.is_none());
    }

    #[test]
    fn test_request_full() {
        let request: ParaphraseRequest =
            serde_json::from_str(r#"{"text":"hi","tone":"formal","stream":true}"#).unwrap();
        assert_eq!(request.text.as_deref(), Some("hi"));
        assert_eq!(request.tone.as_deref(), Some("formal"));
        assert_eq!(request.stream, Some(true));
    }
}
