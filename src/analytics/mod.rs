//! Side-channel usage analytics.
//!
//! Everything in this module is best-effort by contract: no operation
//! here may alter, delay, or fail the primary response path. Failures
//! are logged for operators and otherwise swallowed.

pub mod logbuf;
pub mod middleware;
pub mod payload;
pub mod sink;
pub mod tee;

use crate::config::AnalyticsConfig;
use logbuf::LogBuffer;
use std::sync::Arc;

/// Shared analytics state handed to the middleware and handlers.
#[derive(Clone)]
pub struct AnalyticsContext {
    pub config: Arc<AnalyticsConfig>,
    pub logs: Arc<LogBuffer>,
    pub http_client: reqwest::Client,
}

impl AnalyticsContext {
    pub fn new(config: AnalyticsConfig, http_client: reqwest::Client) -> Self {
        let enabled = config.enabled;
        Self {
            config: Arc::new(config),
            logs: Arc::new(LogBuffer::new(enabled)),
            http_client,
        }
    }

    /// Kill-switch state; when true the middleware is a pass-through.
    pub fn disabled(&self) -> bool {
        !self.config.enabled
    }
}
