use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use super::chat::{ChatRequest, ChatResponse, error_message};
use super::traits::{Translator, require_api_key};
use crate::config::{Provider, TranslatorConfig};
use crate::error::{BackendError, Result};
use crate::util::preview;

/// OpenAI chat-completions translator
pub struct OpenAiTranslator {
    client: Client,
    /// Base URL for the API (e.g., "https://api.openai.com/v1")
    pub api_base: String,
    pub api_key: Option<String>,
    /// Model identifier
    pub model: String,
    system_prompt: String,
}

impl OpenAiTranslator {
    pub fn new(config: &TranslatorConfig) -> Result<Self> {
        Ok(Self {
            client: super::http_client(config)?,
            api_base: config.openai_api_base.clone(),
            api_key: config.openai_api_key.clone(),
            model: config.model_for(Provider::OpenAi).to_string(),
            system_prompt: config.system_prompt(),
        })
    }

    fn error(status: u16, message: impl Into<String>) -> BackendError {
        BackendError::with_status(Provider::OpenAi, status, message)
    }
}

#[async_trait]
impl Translator for OpenAiTranslator {
    fn provider(&self) -> Provider {
        Provider::OpenAi
    }

    async fn translate(&self, text: &str) -> std::result::Result<String, BackendError> {
        let key = require_api_key(Provider::OpenAi, self.api_key.as_deref())?;
        let url = format!("{}/chat/completions", self.api_base.trim_end_matches('/'));
        let request = ChatRequest::translation(&self.model, &self.system_prompt, text);

        debug!("Translation request to {} ({} chars)", url, text.chars().count());

        let response = self
            .client
            .post(&url)
            .bearer_auth(key)
            .json(&request)
            .send()
            .await
            .map_err(|e| BackendError::new(Provider::OpenAi, format!("request failed: {e}")))?;

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

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| Self::error(status.as_u16(), format!("invalid response: {e}")))?;

        chat_response
            .into_text()
            .ok_or_else(|| Self::error(status.as_u16(), "no choices in response"))
    }
}
