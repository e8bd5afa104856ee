//! Streaming-aware analytics middleware.
//!
//! Wraps any handler without changing its external contract: same
//! status, same bytes, and for streaming responses no added latency.
//! A copy of every completed request cycle is assembled into a
//! [`UsagePayload`](crate::analytics::payload::UsagePayload) and handed
//! to the sink; for streaming responses the capture runs as a detached
//! task over the second end of a tee'd body.

use crate::analytics::{payload, payload::CapturedRequest, sink, tee, AnalyticsContext};
use crate::auth::Identity;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, Method},
    middleware::Next,
    response::Response,
};
use serde_json::{json, Value};

/// Upper bound on buffered body capture. Matches the request body limit
/// enforced at the router.
const CAPTURE_LIMIT: usize = 10 * 1024 * 1024;

pub async fn usage_middleware(
    State(ctx): State<AnalyticsContext>,
    req: Request,
    next: Next,
) -> Response {
    if ctx.disabled() {
        return next.run(req).await;
    }

    let start_time_ms = chrono::Utc::now().timestamp_millis();

    let (parts, body) = req.into_parts();
    let captured = CapturedRequest {
        method: parts.method.to_string(),
        url: parts.uri.to_string(),
        headers: parts.headers.clone(),
        body: None,
        identity: parts.extensions.get::<Identity>().cloned(),
    };

    // Inspect the body for methods that may carry one, then hand the
    // handler a request rebuilt from the same bytes so the inspection
    // is invisible to it.
    let (req, request_body) = if may_carry_body(&parts.method) {
        match axum::body::to_bytes(body, CAPTURE_LIMIT).await {
            Ok(bytes) => {
                let snapshot = snapshot_body(&bytes);
                (
                    Request::from_parts(parts, Body::from(bytes)),
                    snapshot,
                )
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read request body for analytics");
                // Hand the handler a body that reproduces the failure so
                // it surfaces as the read error it was, not as empty input
                let msg = e.to_string();
                let failing = Body::from_stream(futures::stream::once(async move {
                    Err::<axum::body::Bytes, String>(msg)
                }));
                (Request::from_parts(parts, failing), None)
            }
        }
    } else {
        (Request::from_parts(parts, body), None)
    };
    let captured = CapturedRequest {
        body: request_body,
        ..captured
    };

    let response = next.run(req).await;

    let (resp_parts, resp_body) = response.into_parts();

    if is_streaming_response(&resp_parts.headers) {
        let content_type = header_str(&resp_parts.headers, header::CONTENT_TYPE);
        let (client_end, capture_end) = tee::tee(resp_body.into_data_stream());

        // Detached capture: the client response returns immediately from
        // one tee end while the other is drained and reported off-path.
        let status = resp_parts.status;
        let resp_headers = resp_parts.headers.clone();
        let ctx = ctx.clone();
        tokio::spawn(async move {
            let response_body = match tee::collect_end(capture_end).await {
                Ok(bytes) => json!({
                    "text": String::from_utf8_lossy(&bytes),
                    "isStreaming": true,
                    "contentType": content_type,
                }),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to capture streamed response");
                    json!({
                        "message": "Failed to capture stream",
                        "isStreaming": true,
                        "contentType": content_type,
                    })
                }
            };

            let usage = payload::build_payload(
                &captured,
                status,
                &resp_headers,
                start_time_ms,
                Some(response_body),
                &ctx.config.product,
                &ctx.logs,
            );
            sink::send(&ctx, &usage).await;
        });

        return Response::from_parts(resp_parts, Body::from_stream(client_end));
    }

    // Buffered path: read the whole body, report, and return the same
    // bytes to the caller.
    let (response, response_body) = match axum::body::to_bytes(resp_body, CAPTURE_LIMIT).await {
        Ok(bytes) => {
            let snapshot = serde_json::from_slice::<Value>(&bytes)
                .unwrap_or_else(|_| json!({ "message": "Non-JSON response" }));
            (
                Response::from_parts(resp_parts, Body::from(bytes)),
                Some(snapshot),
            )
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to read response body");
            let error_body = json!({ "error": "Something went wrong." });
            let response = Response::builder()
                .status(axum::http::StatusCode::INTERNAL_SERVER_ERROR)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(error_body.to_string()))
                .unwrap_or_default();
            (response, Some(error_body))
        }
    };

    let usage = payload::build_payload(
        &captured,
        response.status(),
        response.headers(),
        start_time_ms,
        response_body,
        &ctx.config.product,
        &ctx.logs,
    );
    sink::send(&ctx, &usage).await;

    response
}

fn may_carry_body(method: &Method) -> bool {
    *method == Method::POST || *method == Method::PUT || *method == Method::PATCH
}

/// Structured if the bytes parse as JSON, raw text otherwise, absent
/// for an empty body.
fn snapshot_body(bytes: &[u8]) -> Option<Value> {
    if bytes.is_empty() {
        return None;
    }
    match serde_json::from_slice::<Value>(bytes) {
        Ok(value) => Some(value),
        Err(_) => Some(json!({ "raw": String::from_utf8_lossy(bytes) })),
    }
}

/// A response streams when its content type is an incremental plain-text
/// stream or it is explicitly chunked.
fn is_streaming_response(headers: &HeaderMap) -> bool {
    let content_type = header_str(headers, header::CONTENT_TYPE);
    let transfer_encoding = header_str(headers, header::TRANSFER_ENCODING);

    content_type.contains("text/plain") || transfer_encoding == "chunked"
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}
