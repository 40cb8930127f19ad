mod chat;
mod deepseek;
mod gemini;
mod openai;
mod traits;

pub use deepseek::{API_KEY_HEADER, DEEPSEEK_CHUNK_CHARS, DeepSeekTranslator};
pub use gemini::GeminiTranslator;
pub use openai::OpenAiTranslator;
pub use traits::{PLACEHOLDER_API_KEY, Translator, require_api_key};

use std::sync::Arc;

use reqwest::Client;

use crate::config::{Provider, TranslatorConfig};
use crate::error::{Error, Result};

/// Create the translator for the configured provider
pub fn create_translator(config: &TranslatorConfig) -> Result<Arc<dyn Translator>> {
    let translator: Arc<dyn Translator> = match config.provider {
        Provider::Gemini => Arc::new(GeminiTranslator::new(config)?),
        Provider::OpenAi => Arc::new(OpenAiTranslator::new(config)?),
        Provider::DeepSeek => Arc::new(DeepSeekTranslator::new(config)?),
    };

    Ok(translator)
}

/// HTTP client shared by the adapters' constructors.
fn http_client(config: &TranslatorConfig) -> Result<Client> {
    Client::builder()
        .timeout(config.request_timeout())
        .build()
        .map_err(|e| Error::ConfigLoad(format!("failed to create HTTP client: {e}")))
}
