/// Integration tests for the paraphrase endpoint (Gemini mocked with httpmock)
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    middleware,
    routing::post,
    Router,
};
use httpmock::prelude::*;
use paraphrase_gateway::{
    analytics::{self, AnalyticsContext},
    config::{
        AnalyticsConfig, Config, HumanizeConfig, HumanizeMode, MetricsConfig, ModelConfig,
        ServerConfig,
    },
    handlers::paraphrase::{handle_paraphrase, AppState},
};
use std::sync::Arc;
use tower::ServiceExt;

fn test_config(model_base_url: String, humanize_mode: HumanizeMode) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            log_level: "info".to_string(),
            log_format: "json".to_string(),
        },
        model: ModelConfig {
            api_key: "test-key".to_string(),
            base_url: model_base_url,
            model: "gemini-2.0-flash".to_string(),
            timeout_seconds: 10,
            max_output_tokens: 8192,
            stream_by_default: false,
        },
        analytics: AnalyticsConfig {
            enabled: false,
            base_url: String::new(),
            product: "tabs-editor-tool".to_string(),
        },
        humanize: HumanizeConfig {
            response_mode: humanize_mode,
            word_tolerance: 10,
        },
        metrics: MetricsConfig {
            enabled: false,
            endpoint: "/metrics".to_string(),
        },
        users: vec![],
    }
}

fn build_app(config: Config) -> Router {
    let config = Arc::new(config);
    let http_client = reqwest::Client::new();
    let analytics_ctx = AnalyticsContext::new(config.analytics.clone(), http_client.clone());

    Router::new()
        .route("/api/paraphrase", post(handle_paraphrase))
        .layer(middleware::from_fn_with_state(
            analytics_ctx.clone(),
            analytics::middleware::usage_middleware,
        ))
        .with_state(AppState {
            config,
            http_client,
            analytics: analytics_ctx,
        })
}

fn paraphrase_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/paraphrase")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn gemini_text_response(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }],
        "usageMetadata": {
            "promptTokenCount": 10,
            "candidatesTokenCount": 20,
            "totalTokenCount": 30
        }
    })
}

#[tokio::test]
async fn test_valid_request_returns_result() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/models/gemini-2.0-flash:generateContent")
                .body_includes("The quick brown fox jumps.");
            then.status(200)
                .json_body(gemini_text_response("A swift auburn fox leaps."));
        })
        .await;

    let app = build_app(test_config(server.base_url(), HumanizeMode::Options));
    let response = app
        .oneshot(paraphrase_request(
            r#"{"text": "The quick brown fox jumps.", "tone": "formal"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["result"], "A swift auburn fox leaps.");
}

#[tokio::test]
async fn test_all_supported_tones_return_200() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(200)
                .json_body(gemini_text_response("[\"a\", \"b\", \"c\", \"d\", \"e\"]"));
        })
        .await;

    for tone in ["humanize", "formal", "informal", "concise", "creative", "academic"] {
        let app = build_app(test_config(server.base_url(), HumanizeMode::Options));
        let body = format!(r#"{{"text": "Some input text.", "tone": "{tone}"}}"#);
        let response = app.oneshot(paraphrase_request(&body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "tone {tone}");
    }
}

#[tokio::test]
async fn test_empty_text_rejected() {
    let app = build_app(test_config("http://unused".to_string(), HumanizeMode::Options));
    let response = app
        .oneshot(paraphrase_request(r#"{"text": "", "tone": "formal"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Please provide some text to paraphrase.");
}

#[tokio::test]
async fn test_whitespace_only_text_rejected() {
    let app = build_app(test_config("http://unused".to_string(), HumanizeMode::Options));
    let response = app
        .oneshot(paraphrase_request(r#"{"text": "   \n\t ", "tone": "concise"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Please provide some text to paraphrase.");
}

#[tokio::test]
async fn test_missing_text_rejected() {
    let app = build_app(test_config("http://unused".to_string(), HumanizeMode::Options));
    let response = app
        .oneshot(paraphrase_request(r#"{"tone": "formal"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_json_body_rejected_with_json_error() {
    let app = build_app(test_config("http://unused".to_string(), HumanizeMode::Options));
    let response = app
        .oneshot(paraphrase_request("{not json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("application/json"));
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid request body.");
}

#[tokio::test]
async fn test_content_type_header_is_not_required() {
    let app = build_app(test_config("http://unused".to_string(), HumanizeMode::Options));
    let request = Request::builder()
        .method("POST")
        .uri("/api/paraphrase")
        .body(Body::from(r#"{"text": "hello"}"#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    // The body was parsed despite the missing header; the request fails
    // on the absent tone, not with a 415
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid tone selected.");
}

#[tokio::test]
async fn test_unknown_tone_rejected() {
    let app = build_app(test_config("http://unused".to_string(), HumanizeMode::Options));
    let response = app
        .oneshot(paraphrase_request(r#"{"text": "hello", "tone": "bogus"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid tone selected.");
}

#[tokio::test]
async fn test_missing_tone_rejected() {
    let app = build_app(test_config("http://unused".to_string(), HumanizeMode::Options));
    let response = app
        .oneshot(paraphrase_request(r#"{"text": "hello"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid tone selected.");
}

#[tokio::test]
async fn test_humanize_options_mode_returns_option_list() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/models/gemini-2.0-flash:generateContent")
                .body_includes("5 DISTINCT OPTIONS");
            then.status(200).json_body(gemini_text_response(
                "Here are your options:\n[\"one\", \"two\", \"three\", \"four\", \"five\"]",
            ));
        })
        .await;

    let app = build_app(test_config(server.base_url(), HumanizeMode::Options));
    let response = app
        .oneshot(paraphrase_request(
            r#"{"text": "Make this sound natural.", "tone": "humanize"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let options = body["options"].as_array().unwrap();
    assert_eq!(options.len(), 5);
    assert_eq!(options[0], "one");
}

#[tokio::test]
async fn test_humanize_options_falls_back_to_raw_text() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(200)
                .json_body(gemini_text_response("Not an array at all."));
        })
        .await;

    let app = build_app(test_config(server.base_url(), HumanizeMode::Options));
    let response = app
        .oneshot(paraphrase_request(
            r#"{"text": "Make this sound natural.", "tone": "humanize"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["result"], "Not an array at all.");
}

#[tokio::test]
async fn test_streaming_mode_flushes_plain_text() {
    let server = MockServer::start_async().await;

    let sse_body = concat!(
        "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"A calm \"}]}}]}\n\n",
        "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"auburn fox \"}]}}]}\n\n",
        "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"leaps high.\"}]}}]}\n\n",
    );
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/models/gemini-2.0-flash:streamGenerateContent")
                .query_param("alt", "sse");
            then.status(200)
                .header("content-type", "text/event-stream")
                .body(sse_body);
        })
        .await;

    let app = build_app(test_config(server.base_url(), HumanizeMode::Rewrite));
    let response = app
        .oneshot(paraphrase_request(
            r#"{"text": "The quick brown fox jumps.", "tone": "formal", "stream": true}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("text/plain"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"A calm auburn fox leaps high.");
}

#[tokio::test]
async fn test_streaming_humanize_rewrite_keeps_word_count_in_band() {
    let server = MockServer::start_async().await;

    // A 100-word input and a 103-word mock rewrite: within the default
    // tolerance of 10 words.
    let input = vec!["word"; 100].join(" ");
    let rewrite = vec!["term"; 103].join(" ");
    let sse_body = format!(
        "data: {{\"candidates\":[{{\"content\":{{\"role\":\"model\",\"parts\":[{{\"text\":\"{rewrite}\"}}]}}}}]}}\n\n"
    );
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/models/gemini-2.0-flash:streamGenerateContent")
                .body_includes("approximately 100 words");
            then.status(200).body(sse_body);
        })
        .await;

    let app = build_app(test_config(server.base_url(), HumanizeMode::Rewrite));
    let body = serde_json::json!({"text": input, "tone": "humanize", "stream": true}).to_string();
    let response = app.oneshot(paraphrase_request(&body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let output = String::from_utf8(bytes.to_vec()).unwrap();

    assert_ne!(output, input);
    let delta = output.split_whitespace().count() as i64 - 100;
    assert!(delta.abs() <= 10, "word count drift {delta} out of band");
}

#[tokio::test]
async fn test_upstream_failure_returns_generic_500() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(503).body("model overloaded; key=sk-internal");
        })
        .await;

    let app = build_app(test_config(server.base_url(), HumanizeMode::Options));
    let response = app
        .oneshot(paraphrase_request(r#"{"text": "hello", "tone": "formal"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Something went wrong.");
}

#[tokio::test]
async fn test_unreachable_model_returns_generic_500() {
    let app = build_app(test_config(
        "http://127.0.0.1:1".to_string(),
        HumanizeMode::Options,
    ));
    let response = app
        .oneshot(paraphrase_request(r#"{"text": "hello", "tone": "formal"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Something went wrong.");
}
