use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// Request validation error (malformed body, missing text, unknown tone)
    #[error("Validation error: {0}")]
    Validation(String),
    /// Upstream model API error
    #[error("Upstream error ({status}): {message}")]
    UpstreamError { status: StatusCode, message: String },
    /// Malformed model output (e.g. empty candidates, broken JSON options)
    #[error("Malformed model output: {0}")]
    MalformedOutput(String),
    /// Internal server error
    #[error("Internal error: {0}")]
    InternalError(String),
    /// HTTP request error (preserves reqwest::Error for diagnostics)
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Validation failures carry their message to the caller; everything
        // else collapses into a generic 500 so upstream details never leak.
        let (status, error_message) = match &self {
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::ConfigError(_)
            | Self::UpstreamError { .. }
            | Self::MalformedOutput(_)
            | Self::InternalError(_)
            | Self::HttpRequest(_) => {
                tracing::error!(error = %self, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong.".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": error_message }));

        (status, body).into_response()
    }
}

// Implement conversions from common error types
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedOutput(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = AppError::Validation("Invalid tone selected.".to_string());
        assert_eq!(error.to_string(), "Validation error: Invalid tone selected.");

        let error = AppError::UpstreamError {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: "overloaded".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Upstream error (503 Service Unavailable): overloaded"
        );
    }

    #[tokio::test]
    async fn test_validation_error_response() {
        let error = AppError::Validation("Please provide some text to paraphrase.".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Please provide some text to paraphrase.");
    }

    #[tokio::test]
    async fn test_upstream_error_is_generic() {
        let error = AppError::UpstreamError {
            status: StatusCode::TOO_MANY_REQUESTS,
            message: "quota exceeded for key sk-secret".to_string(),
        };
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Something went wrong.");
    }
}
