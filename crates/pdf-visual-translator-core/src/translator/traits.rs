use async_trait::async_trait;

use crate::config::Provider;
use crate::error::BackendError;

/// Placeholder that ships in sample configs; treated as "no key".
pub const PLACEHOLDER_API_KEY: &str = "PLACEHOLDER_API_KEY";

/// Trait for translation backends
///
/// One call translates one text span. Adapters make a single attempt;
/// retrying is the caller's job.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Backend this adapter talks to
    fn provider(&self) -> Provider;

    /// Largest text span, in characters, the backend accepts per call.
    ///
    /// `None` means the whole page goes in one call.
    fn max_chunk_chars(&self) -> Option<usize> {
        None
    }

    /// Translate text into the configured target language
    async fn translate(&self, text: &str) -> Result<String, BackendError>;
}

/// Reject a missing or placeholder key before any request is made.
pub fn require_api_key(provider: Provider, key: Option<&str>) -> Result<String, BackendError> {
    match key.map(str::trim) {
        Some(key) if !key.is_empty() && key != PLACEHOLDER_API_KEY => Ok(key.to_string()),
        _ => Err(BackendError::fatal(
            provider,
            format!("{} API key is not configured", provider),
        )),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_require_api_key() {
        assert_eq!(require_api_key(Provider::Gemini, Some(" k1 ")).ok().as_deref(), Some("k1"));
        assert!(require_api_key(Provider::Gemini, None).is_err());
        assert!(require_api_key(Provider::Gemini, Some("")).is_err());
        let err = require_api_key(Provider::OpenAi, Some(PLACEHOLDER_API_KEY)).unwrap_err();
        assert_eq!(err.provider, Provider::OpenAi);
        assert_eq!(err.status, None);
        assert!(!err.retryable);
    }
}
