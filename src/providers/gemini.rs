use crate::{config::ModelConfig, error::AppError, models::gemini::GenerateContentRequest};
use reqwest::Client;
use std::time::Duration;

/// Call Gemini Generate Content API (buffered)
/// Note: Model name is part of the URL path
pub async fn generate_content(
    client: &Client,
    config: &ModelConfig,
    request: GenerateContentRequest,
) -> Result<reqwest::Response, AppError> {
    // Gemini API format: /v1beta/models/{model}:generateContent
    let url = format!("{}/models/{}:generateContent", config.base_url, config.model);

    send(client, config, &url, &[], request).await
}

/// Call Gemini Streaming Generate Content API; the response body is an
/// SSE stream of partial `GenerateContentResponse` chunks.
pub async fn stream_generate_content(
    client: &Client,
    config: &ModelConfig,
    request: GenerateContentRequest,
) -> Result<reqwest::Response, AppError> {
    let url = format!(
        "{}/models/{}:streamGenerateContent",
        config.base_url, config.model
    );

    send(client, config, &url, &[("alt", "sse")], request).await
}

async fn send(
    client: &Client,
    config: &ModelConfig,
    url: &str,
    extra_query: &[(&str, &str)],
    request: GenerateContentRequest,
) -> Result<reqwest::Response, AppError> {
    let mut builder = client
        .post(url)
        .header("Content-Type", "application/json")
        .timeout(Duration::from_secs(config.timeout_seconds))
        .query(&[("key", config.api_key.as_str())]);

    if !extra_query.is_empty() {
        builder = builder.query(extra_query);
    }

    let response = builder.json(&request).send().await?;

    // Check for HTTP errors
    if !response.status().is_success() {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(AppError::UpstreamError {
            status,
            message: error_text,
        });
    }

    Ok(response)
}
