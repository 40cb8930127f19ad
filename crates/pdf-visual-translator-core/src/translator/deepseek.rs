//! DeepSeek, reached through the relay service.
//!
//! The relay holds no credentials of its own: the key travels in the
//! `x-api-key` header and the relay forwards it upstream. Relay and upstream
//! failures both come back as JSON with an `error` field; anything that is
//! not JSON is reported with a short preview of the body.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use tracing::{debug, warn};

use super::chat::{ChatRequest, ChatResponse, error_message};
use super::traits::{Translator, require_api_key};
use crate::config::{Provider, TranslatorConfig};
use crate::error::{BackendError, Result};
use crate::util::preview;

/// Largest span sent in one relay call.
pub const DEEPSEEK_CHUNK_CHARS: usize = 1500;

/// Header carrying the caller's DeepSeek key to the relay.
pub const API_KEY_HEADER: &str = "x-api-key";

/// DeepSeek chat translator speaking to the relay
pub struct DeepSeekTranslator {
    client: Client,
    /// Relay endpoint (e.g., "http://127.0.0.1:3000/api/deepseek")
    pub relay_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub chunk_chars: usize,
    system_prompt: String,
}

impl DeepSeekTranslator {
    pub fn new(config: &TranslatorConfig) -> Result<Self> {
        Ok(Self {
            client: super::http_client(config)?,
            relay_url: config.relay_url.clone(),
            api_key: config.deepseek_api_key.clone(),
            model: config.model_for(Provider::DeepSeek).to_string(),
            chunk_chars: config.chunk_limit.unwrap_or(DEEPSEEK_CHUNK_CHARS),
            system_prompt: config.system_prompt(),
        })
    }

    fn error(status: u16, message: impl Into<String>) -> BackendError {
        BackendError::with_status(Provider::DeepSeek, status, message)
    }
}

#[async_trait]
impl Translator for DeepSeekTranslator {
    fn provider(&self) -> Provider {
        Provider::DeepSeek
    }

    fn max_chunk_chars(&self) -> Option<usize> {
        Some(self.chunk_chars)
    }

    async fn translate(&self, text: &str) -> std::result::Result<String, BackendError> {
        let key = require_api_key(Provider::DeepSeek, self.api_key.as_deref())?;
        let request = ChatRequest::translation(&self.model, &self.system_prompt, text);

        debug!(
            "Translation request to {} ({} chars)",
            self.relay_url,
            text.chars().count()
        );

        let response = self
            .client
            .post(&self.relay_url)
            .header(API_KEY_HEADER, key)
            .json(&request)
            .send()
            .await
            .map_err(|e| BackendError::new(Provider::DeepSeek, format!("request failed: {e}")))?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("application/json"));

        let body = response
            .text()
            .await
            .map_err(|e| Self::error(status.as_u16(), format!("failed to read response: {e}")))?;

        if !is_json {
            warn!("Relay returned non-JSON ({}): {}", status, preview(&body, 200));
            return Err(Self::error(
                status.as_u16(),
                format!("non-JSON response: {}", preview(&body, 100)),
            ));
        }

        let data: Value = serde_json::from_str(&body)
            .map_err(|e| Self::error(status.as_u16(), format!("malformed JSON response: {e}")))?;

        if !status.is_success() {
            let message = error_message(&data)
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(Self::error(status.as_u16(), message));
        }

        // Some failures arrive with a 2xx status
        if data.get("error").is_some_and(|e| !e.is_null()) {
            let message = error_message(&data).unwrap_or_default();
            return Err(Self::error(status.as_u16(), message));
        }

        let chat_response: ChatResponse = serde_json::from_value(data)
            .map_err(|e| Self::error(status.as_u16(), format!("invalid response: {e}")))?;

        chat_response
            .into_text()
            .ok_or_else(|| Self::error(status.as_u16(), "no choices in response"))
    }
}
