//! Best-effort delivery of usage payloads to the collector.

use crate::analytics::{payload::UsagePayload, AnalyticsContext};
use crate::metrics;

/// Deliver a payload to the collector. At-most-once, never fails the
/// caller: every error path is logged and swallowed. Short-circuits
/// without a network call when the kill-switch is set or no collector
/// is configured.
pub async fn send(ctx: &AnalyticsContext, payload: &UsagePayload) {
    if ctx.disabled() {
        return;
    }

    let base_url = ctx.config.base_url.trim_end_matches('/');
    if base_url.is_empty() {
        tracing::warn!("Analytics collector base URL not configured");
        return;
    }

    let endpoint = format!("{}/api/ingest/{}", base_url, payload.product);

    match ctx.http_client.post(&endpoint).json(payload).send().await {
        Ok(response) if response.status().is_success() => {
            tracing::debug!(payload_id = %payload.id, "Delivered usage payload");
        }
        Ok(response) => {
            metrics::record_analytics_failure("http_status");
            tracing::warn!(
                status = %response.status(),
                payload_id = %payload.id,
                "Analytics collector rejected payload"
            );
        }
        Err(e) => {
            metrics::record_analytics_failure("network");
            tracing::warn!(error = %e, payload_id = %payload.id, "Analytics delivery failed");
        }
    }
}
