//! The relay endpoint.
//!
//! Accepts an OpenAI-style chat request with the caller's key in `x-api-key`,
//! forwards it upstream with bearer auth, and passes the upstream JSON and
//! status straight back. Upstream answers that are not JSON, or no answer at
//! all, become a normalized 502 body.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use bytes::Bytes;
use pdf_visual_translator_core::translator::API_KEY_HEADER;
use serde_json::Value;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, warn};

use crate::helpers::{OptionExt, ResultExt, RouteResult, bad_gateway};
use crate::state::RelayState;

/// Path the translator posts to.
pub const RELAY_PATH: &str = "/api/deepseek";

const JSON_CONTENT_TYPE: &str = "application/json";

/// Build the relay router.
pub fn router(state: Arc<RelayState>) -> Router {
    Router::new()
        .route(RELAY_PATH, post(forward))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// POST /api/deepseek - forward a chat request upstream
pub async fn forward(State(state): State<Arc<RelayState>>, headers: HeaderMap, body: Bytes) -> RouteResult<Response> {
    let api_key = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .or_unauthorized("API key missing")?;

    serde_json::from_slice::<Value>(&body).or_bad_request("Request body is not valid JSON")?;

    debug!("Forwarding {} byte request to {}", body.len(), state.upstream_url);

    let upstream = state
        .client
        .post(&state.upstream_url)
        .bearer_auth(api_key)
        .header(header::CONTENT_TYPE, JSON_CONTENT_TYPE)
        .body(body)
        .send()
        .await
        .map_err(|e| {
            warn!("Upstream unreachable: {}", e);
            bad_gateway(0, &format!("Upstream request failed: {e}"), "")
        })?;

    let status = upstream.status();
    let raw = upstream.text().await.map_err(|e| {
        warn!("Failed to read upstream body: {}", e);
        bad_gateway(status.as_u16(), &format!("Failed to read upstream response: {e}"), "")
    })?;

    // Checked, not re-encoded: the caller gets the upstream bytes as-is
    serde_json::from_str::<Value>(&raw).map_err(|e| {
        warn!("Upstream returned non-JSON ({}): {}", status, e);
        bad_gateway(status.as_u16(), &format!("Upstream returned non-JSON content: {e}"), &raw)
    })?;

    if !status.is_success() {
        warn!("Upstream error {}", status);
    }

    Ok((status, [(header::CONTENT_TYPE, JSON_CONTENT_TYPE)], raw).into_response())
}
