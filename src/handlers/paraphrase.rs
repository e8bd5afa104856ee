use crate::{
    analytics::AnalyticsContext,
    config::{Config, HumanizeMode},
    error::AppError,
    metrics,
    models::{
        api::{ParaphraseOptions, ParaphraseRequest, ParaphraseResult},
        gemini::{
            Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part,
            SystemInstruction,
        },
    },
    prompts::{self, Tone},
    providers, streaming,
};
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use std::time::Instant;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub http_client: reqwest::Client,
    pub analytics: AnalyticsContext,
}

/// Handle /api/paraphrase endpoint
///
/// Validates the input, builds a tone-specific model request and returns
/// either a buffered JSON result or a live plain-text token stream.
pub async fn handle_paraphrase(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, AppError> {
    let start = Instant::now();

    // Parsed by hand rather than through the Json extractor: a malformed
    // body must answer with the same {"error": ...} JSON shape as every
    // other validation failure, and the content type is not consulted.
    let request: ParaphraseRequest = serde_json::from_slice(&body)
        .map_err(|_| AppError::Validation("Invalid request body.".to_string()))?;

    let text = request
        .text
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| {
            AppError::Validation("Please provide some text to paraphrase.".to_string())
        })?;

    let tone: Tone = request
        .tone
        .as_deref()
        .unwrap_or("")
        .parse()
        .map_err(|_| AppError::Validation("Invalid tone selected.".to_string()))?;

    let words = prompts::word_count(text);
    let paragraphs = prompts::paragraph_count(text);

    // Humanize options mode parses a JSON array out of the full model
    // output and is therefore always buffered.
    let options_mode =
        tone == Tone::Humanize && state.config.humanize.response_mode == HumanizeMode::Options;
    let is_stream = !options_mode
        && request
            .stream
            .unwrap_or(state.config.model.stream_by_default);

    tracing::info!(
        tone = %tone,
        words,
        paragraphs,
        stream = is_stream,
        "Handling paraphrase request"
    );
    state.analytics.logs.info("Handling paraphrase request", {
        let mut fields = serde_json::Map::new();
        fields.insert("tone".to_string(), tone.as_str().into());
        fields.insert("words".to_string(), words.into());
        fields
    });
    metrics::record_request(tone.as_str(), if is_stream { "streaming" } else { "buffered" });

    let model_request = build_model_request(&state.config, tone, text, words, paragraphs);

    let result = if is_stream {
        handle_streaming(&state, model_request).await
    } else {
        handle_buffered(&state, tone, options_mode, model_request, start).await
    };

    if let Err(e) = &result {
        metrics::record_error(tone.as_str(), "upstream");
        state.analytics.logs.error("Paraphrase request failed", {
            let mut fields = serde_json::Map::new();
            fields.insert("tone".to_string(), tone.as_str().into());
            fields.insert("error".to_string(), e.to_string().into());
            fields
        });
    }

    result
}

fn build_model_request(
    config: &Config,
    tone: Tone,
    text: &str,
    words: usize,
    paragraphs: usize,
) -> GenerateContentRequest {
    let system_instruction = if tone == Tone::Humanize {
        let prompt = match config.humanize.response_mode {
            HumanizeMode::Options => {
                prompts::humanize_options_system_prompt(words, config.humanize.word_tolerance)
            }
            HumanizeMode::Rewrite => prompts::humanize_rewrite_system_prompt(
                words,
                paragraphs,
                config.humanize.word_tolerance,
            ),
        };
        Some(SystemInstruction {
            parts: vec![Part { text: prompt }],
        })
    } else {
        None
    };

    GenerateContentRequest {
        contents: vec![Content {
            role: "user".to_string(),
            parts: vec![Part {
                text: prompts::build_user_prompt(tone, text, words),
            }],
        }],
        system_instruction,
        generation_config: Some(GenerationConfig {
            temperature: None,
            max_output_tokens: Some(config.model.max_output_tokens),
        }),
    }
}

/// Streaming mode: forward model fragments as plain-text bytes as soon
/// as they are produced. Once the stream has begun, a mid-stream model
/// failure surfaces to the client as a broken connection.
async fn handle_streaming(
    state: &AppState,
    model_request: GenerateContentRequest,
) -> Result<Response, AppError> {
    let upstream = providers::gemini::stream_generate_content(
        &state.http_client,
        &state.config.model,
        model_request,
    )
    .await?;

    let fragments = streaming::text_fragment_stream(upstream);

    let response = Response::builder()
        .status(axum::http::StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Body::from_stream(fragments))
        .map_err(|e| AppError::InternalError(e.to_string()))?;

    Ok(response)
}

/// Buffered mode: one blocking model call, full text in a single JSON
/// response.
async fn handle_buffered(
    state: &AppState,
    tone: Tone,
    options_mode: bool,
    model_request: GenerateContentRequest,
    start: Instant,
) -> Result<Response, AppError> {
    let response = providers::gemini::generate_content(
        &state.http_client,
        &state.config.model,
        model_request,
    )
    .await?;

    let body: GenerateContentResponse = response.json().await?;
    let raw_text = body.text();

    metrics::record_duration(tone.as_str(), start.elapsed());
    tracing::info!(
        tone = %tone,
        duration_ms = start.elapsed().as_millis(),
        output_tokens = body
            .usage_metadata
            .as_ref()
            .map(|u| u.candidates_token_count),
        "Completed paraphrase request"
    );

    if options_mode {
        // The model is instructed to answer with a flat JSON array; fall
        // back to the raw text when it does not comply.
        if let Some(options) = extract_json_options(&raw_text) {
            return Ok(Json(ParaphraseOptions { options }).into_response());
        }
        tracing::warn!("Humanize options output was not a JSON array, returning raw text");
    }

    Ok(Json(ParaphraseResult { result: raw_text }).into_response())
}

/// Extract a JSON string array embedded in model output (the model may
/// wrap it in prose or code fences).
fn extract_json_options(raw: &str) -> Option<Vec<String>> {
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&raw[start..=end]).ok()
}
