//! Backend adapters against in-process stub servers.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use pdf_visual_translator_core::config::TranslatorConfig;
use pdf_visual_translator_core::translator::{
    DeepSeekTranslator, GeminiTranslator, OpenAiTranslator, PLACEHOLDER_API_KEY,
};
use pdf_visual_translator_core::{Provider, Translator};
use serde_json::{Value, json};

/// Serve `app` on an ephemeral port and return its base URL.
async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    format!("http://{addr}")
}

fn user_message(body: &Value) -> String {
    body["messages"][1]["content"].as_str().unwrap_or_default().to_string()
}

fn deepseek_config(base: &str, path: &str) -> TranslatorConfig {
    TranslatorConfig {
        provider: Provider::DeepSeek,
        deepseek_api_key: Some("sk-test".to_string()),
        relay_url: format!("{base}{path}"),
        ..TranslatorConfig::default()
    }
}

// =============================================================================
// DeepSeek via relay
// =============================================================================

async fn relay_ok(State(calls): State<Arc<AtomicUsize>>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    calls.fetch_add(1, Ordering::SeqCst);
    if headers.get("x-api-key").and_then(|v| v.to_str().ok()) != Some("sk-test") {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "API key missing"}))).into_response();
    }
    assert_eq!(body["model"], "deepseek-chat");
    assert_eq!(body["messages"][0]["role"], "system");
    let text = user_message(&body);
    Json(json!({"choices": [{"message": {"content": format!("PT({})", text.len())}}]})).into_response()
}

async fn relay_html() -> Response {
    (
        StatusCode::BAD_GATEWAY,
        [(header::CONTENT_TYPE, "text/html")],
        "<html><body>An error occurred with your deployment</body></html>",
    )
        .into_response()
}

async fn relay_unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({"error": "API key missing"}))).into_response()
}

async fn relay_error_in_success() -> Response {
    Json(json!({"error": {"message": "Insufficient Balance"}})).into_response()
}

async fn relay_server() -> (String, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route("/api/deepseek", post(relay_ok))
        .route("/html", post(relay_html))
        .route("/unauthorized", post(relay_unauthorized))
        .route("/error-in-success", post(relay_error_in_success))
        .with_state(Arc::clone(&calls));
    (serve(app).await, calls)
}

#[tokio::test]
async fn test_deepseek_success() {
    let (base, calls) = relay_server().await;
    let translator = DeepSeekTranslator::new(&deepseek_config(&base, "/api/deepseek")).unwrap();

    assert_eq!(translator.translate("hello").await.unwrap(), "PT(5)");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(translator.max_chunk_chars(), Some(1500));
}

#[tokio::test]
async fn test_deepseek_non_json_response() {
    let (base, _) = relay_server().await;
    let translator = DeepSeekTranslator::new(&deepseek_config(&base, "/html")).unwrap();

    let err = translator.translate("hello").await.unwrap_err();

    assert_eq!(err.status, Some(502));
    assert!(err.message.contains("non-JSON"), "got: {}", err.message);
    assert!(err.message.contains("An error occurred"), "got: {}", err.message);
    assert!(err.hint().contains("Upstream service"));
}

#[tokio::test]
async fn test_deepseek_json_error_status() {
    let (base, _) = relay_server().await;
    let translator = DeepSeekTranslator::new(&deepseek_config(&base, "/unauthorized")).unwrap();

    let err = translator.translate("hello").await.unwrap_err();

    assert_eq!(err.status, Some(401));
    assert_eq!(err.message, "API key missing");
    assert!(err.hint().contains("API key"));
}

#[tokio::test]
async fn test_deepseek_error_field_in_success_body() {
    let (base, _) = relay_server().await;
    let translator = DeepSeekTranslator::new(&deepseek_config(&base, "/error-in-success")).unwrap();

    let err = translator.translate("hello").await.unwrap_err();

    assert_eq!(err.status, Some(200));
    assert_eq!(err.message, "Insufficient Balance");
}

#[tokio::test]
async fn test_deepseek_placeholder_key_makes_no_request() {
    let (base, calls) = relay_server().await;
    let mut config = deepseek_config(&base, "/api/deepseek");
    config.deepseek_api_key = Some(PLACEHOLDER_API_KEY.to_string());
    let translator = DeepSeekTranslator::new(&config).unwrap();

    let err = translator.translate("hello").await.unwrap_err();

    assert_eq!(err.status, None);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

// =============================================================================
// OpenAI
// =============================================================================

async fn openai_chat(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) != Some("Bearer sk-openai") {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}})),
        )
            .into_response();
    }
    assert_eq!(body["model"], "gpt-4o-mini");
    let text = user_message(&body);
    Json(json!({"choices": [{"message": {"role": "assistant", "content": format!(" {} traduzido ", text)}}]}))
        .into_response()
}

#[tokio::test]
async fn test_openai_success_and_auth_failure() {
    let base = serve(Router::new().route("/v1/chat/completions", post(openai_chat))).await;
    let mut config = TranslatorConfig {
        provider: Provider::OpenAi,
        openai_api_key: Some("sk-openai".to_string()),
        openai_api_base: format!("{base}/v1/"),
        ..TranslatorConfig::default()
    };

    let translator = OpenAiTranslator::new(&config).unwrap();
    assert_eq!(translator.translate("texto").await.unwrap(), "texto traduzido");

    config.openai_api_key = Some("wrong".to_string());
    let translator = OpenAiTranslator::new(&config).unwrap();
    let err = translator.translate("texto").await.unwrap_err();
    assert_eq!(err.status, Some(401));
    assert_eq!(err.message, "Incorrect API key provided");
}

// =============================================================================
// Gemini
// =============================================================================

async fn gemini_fallback(uri: Uri, Json(body): Json<Value>) -> Response {
    let query = uri.query().unwrap_or_default();
    if uri.path() != "/v1beta/models/gemini-2.0-flash:generateContent" || query != "key=g-key" {
        return (StatusCode::NOT_FOUND, Json(json!({"error": {"code": 404, "message": "not found"}})))
            .into_response();
    }
    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap_or_default();
    assert!(prompt.starts_with("You are a professional translator."));
    assert!(prompt.ends_with("Text to translate:\nhello"));
    Json(json!({
        "candidates": [{"content": {"parts": [{"text": "olá "}, {"text": "mundo"}], "role": "model"}}]
    }))
    .into_response()
}

#[tokio::test]
async fn test_gemini_joins_parts() {
    let base = serve(Router::new().fallback(gemini_fallback)).await;
    let config = TranslatorConfig {
        provider: Provider::Gemini,
        gemini_api_key: Some("g-key".to_string()),
        gemini_api_base: format!("{base}/v1beta"),
        ..TranslatorConfig::default()
    };

    let translator = GeminiTranslator::new(&config).unwrap();
    assert_eq!(translator.translate("hello").await.unwrap(), "olá mundo");
}

#[tokio::test]
async fn test_gemini_wrong_model_surfaces_status() {
    let base = serve(Router::new().fallback(gemini_fallback)).await;
    let config = TranslatorConfig {
        provider: Provider::Gemini,
        gemini_api_key: Some("g-key".to_string()),
        gemini_api_base: format!("{base}/v1beta"),
        model: Some("gemini-0".to_string()),
        ..TranslatorConfig::default()
    };

    let err = GeminiTranslator::new(&config).unwrap().translate("hello").await.unwrap_err();
    assert_eq!(err.status, Some(404));
    assert_eq!(err.message, "not found");
}
