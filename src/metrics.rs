use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics exporter
pub fn init_metrics() -> PrometheusHandle {
    let builder = PrometheusBuilder::new();

    let handle = builder
        .install_recorder()
        .expect("Failed to install Prometheus recorder");

    init_metric_descriptions();

    handle
}

/// Initialize metric descriptions (can be called multiple times safely)
fn init_metric_descriptions() {
    describe_counter!(
        "paraphrase_requests_total",
        "Total number of paraphrase requests"
    );
    describe_histogram!(
        "paraphrase_request_duration_seconds",
        "Paraphrase request duration in seconds"
    );
    describe_counter!(
        "paraphrase_errors_total",
        "Total number of paraphrase request errors"
    );
    describe_counter!(
        "analytics_delivery_failures_total",
        "Usage payloads that could not be delivered to the collector"
    );
}

/// Record a request
pub fn record_request(tone: &str, mode: &str) {
    counter!(
        "paraphrase_requests_total",
        "tone" => tone.to_string(),
        "mode" => mode.to_string(),
    )
    .increment(1);
}

/// Record request duration
pub fn record_duration(tone: &str, duration: Duration) {
    histogram!(
        "paraphrase_request_duration_seconds",
        "tone" => tone.to_string(),
    )
    .record(duration.as_secs_f64());
}

/// Record an error
pub fn record_error(tone: &str, error_type: &str) {
    counter!(
        "paraphrase_errors_total",
        "tone" => tone.to_string(),
        "error_type" => error_type.to_string(),
    )
    .increment(1);
}

/// Record a swallowed analytics delivery failure
pub fn record_analytics_failure(reason: &str) {
    counter!(
        "analytics_delivery_failures_total",
        "reason" => reason.to_string(),
    )
    .increment(1);
}
