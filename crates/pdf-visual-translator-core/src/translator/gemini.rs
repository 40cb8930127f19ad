use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::chat::error_message;
use super::traits::{Translator, require_api_key};
use crate::config::{Provider, TranslatorConfig};
use crate::error::{BackendError, Result};
use crate::util::preview;

/// Google Gemini `generateContent` translator
pub struct GeminiTranslator {
    client: Client,
    /// Base URL for the API (e.g., "https://generativelanguage.googleapis.com/v1beta")
    pub api_base: String,
    pub api_key: Option<String>,
    pub model: String,
    system_prompt: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GeminiTranslator {
    pub fn new(config: &TranslatorConfig) -> Result<Self> {
        Ok(Self {
            client: super::http_client(config)?,
            api_base: config.gemini_api_base.clone(),
            api_key: config.gemini_api_key.clone(),
            model: config.model_for(Provider::Gemini).to_string(),
            system_prompt: config.system_prompt(),
        })
    }

    /// Gemini takes a single prompt, so the instruction is prepended.
    fn create_prompt(&self, text: &str) -> String {
        format!("{}\n\nText to translate:\n{}", self.system_prompt, text)
    }

    fn error(status: u16, message: impl Into<String>) -> BackendError {
        BackendError::with_status(Provider::Gemini, status, message)
    }
}

#[async_trait]
impl Translator for GeminiTranslator {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    async fn translate(&self, text: &str) -> std::result::Result<String, BackendError> {
        let key = require_api_key(Provider::Gemini, self.api_key.as_deref())?;
        let url = format!(
            "{}/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        );
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: self.create_prompt(text),
                }],
            }],
        };

        debug!("Translation request to {} ({} chars)", url, text.chars().count());

        let response = self
            .client
            .post(&url)
            .query(&[("key", key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| BackendError::new(Provider::Gemini, format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("API error: {} - {}", status, preview(&body, 200));
            let message = serde_json::from_str(&body)
                .ok()
                .and_then(|value| error_message(&value))
                .unwrap_or_else(|| preview(&body, 100));
            return Err(Self::error(status.as_u16(), message));
        }

        let reply: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Self::error(status.as_u16(), format!("invalid response: {e}")))?;

        let content = reply
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .ok_or_else(|| Self::error(status.as_u16(), "no candidates in response"))?;

        Ok(content
            .parts
            .into_iter()
            .map(|part| part.text)
            .collect::<String>()
            .trim()
            .to_string())
    }
}
