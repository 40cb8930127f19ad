use thiserror::Error;

use crate::config::Provider;

/// Unified error type for pdf-visual-translator-core
///
/// This enum encompasses all error cases that can occur in the library:
/// - Extraction (document unreadable or malformed)
/// - Rasterization of a single page
/// - Remote translation backends
/// - Pipeline failures that abort a translation run part-way
/// - Checkpoint storage, composition and configuration
#[derive(Error, Debug)]
pub enum Error {
    // ==========================================================================
    // Extraction Errors
    // ==========================================================================
    /// Input rejected before parsing (size limit, wrong signature)
    #[error("invalid input document: {0}")]
    InvalidInput(String),

    /// Document could not be parsed, or a page could not be read
    #[error("failed to extract text{}: {reason}", page.map(|p| format!(" from page {p}")).unwrap_or_default())]
    Extraction { page: Option<usize>, reason: String },

    /// Requested page is outside the document
    #[error("invalid page number {page} (document has {total} pages)")]
    InvalidPage { page: usize, total: usize },

    // ==========================================================================
    // Render Errors
    // ==========================================================================
    /// Failed to rasterize a page
    #[error("failed to render page {page}: {reason}")]
    Render { page: usize, reason: String },

    // ==========================================================================
    // Translation Errors
    // ==========================================================================
    /// A translation backend call failed
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// A translation batch failed; everything before it is checkpointed
    #[error("translation failed at page {page} ({completed}/{total} pages completed): {source}")]
    Pipeline {
        page: usize,
        completed: usize,
        total: usize,
        #[source]
        source: Box<Error>,
    },

    // ==========================================================================
    // Checkpoint Errors
    // ==========================================================================
    /// Failed to open, read or write the checkpoint store
    #[error("checkpoint store error: {0}")]
    Checkpoint(String),

    // ==========================================================================
    // Composition Errors
    // ==========================================================================
    /// Failed to assemble the output document
    #[error("failed to compose output PDF: {0}")]
    Compose(String),

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Failed to load configuration file
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    /// Invalid configuration value
    #[error("invalid config value for '{field}': {reason}")]
    ConfigInvalid { field: String, reason: String },

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Page counters of a failed pipeline run, as `(completed, total)`.
    pub const fn progress(&self) -> Option<(usize, usize)> {
        match self {
            Self::Pipeline { completed, total, .. } => Some((*completed, *total)),
            _ => None,
        }
    }
}

/// Remote translation failure.
///
/// Carries the HTTP status when the backend answered at all, which is what
/// [`BackendError::hint`] uses to pick a remediation. Failures that no
/// amount of waiting can fix (a missing key) are marked not retryable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{provider} API error{}: {message}", status.map(|s| format!(" ({s})")).unwrap_or_default())]
pub struct BackendError {
    pub provider: Provider,
    pub status: Option<u16>,
    pub message: String,
    pub retryable: bool,
}

impl BackendError {
    pub fn new(provider: Provider, message: impl Into<String>) -> Self {
        Self {
            provider,
            status: None,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn with_status(provider: Provider, status: u16, message: impl Into<String>) -> Self {
        Self {
            provider,
            status: Some(status),
            message: message.into(),
            retryable: true,
        }
    }

    /// A failure the request never got far enough to retry.
    pub fn fatal(provider: Provider, message: impl Into<String>) -> Self {
        Self {
            retryable: false,
            ..Self::new(provider, message)
        }
    }

    /// Remediation hint for this failure.
    pub fn hint(&self) -> &'static str {
        match self.status {
            Some(status) => remediation_hint(status),
            None if !self.retryable => "Set the API key for the selected provider",
            None => "Check network connectivity to the translation backend",
        }
    }
}

/// Map an upstream HTTP status to a short remediation hint.
pub const fn remediation_hint(status: u16) -> &'static str {
    match status {
        401 | 403 => "Check that the API key is valid and has access to the model",
        429 => "Rate limited by the upstream API; wait and retry",
        500..=u16::MAX => "Upstream service error; try again later",
        _ => "Unexpected upstream response; check the request and relay configuration",
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_error_reports_counts() {
        let err = Error::Pipeline {
            page: 3,
            completed: 2,
            total: 5,
            source: Box::new(BackendError::with_status(Provider::DeepSeek, 500, "boom").into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("2/5 pages"), "got: {msg}");
        assert!(msg.contains("page 3"), "got: {msg}");
        assert!(msg.contains("boom"), "got: {msg}");
        assert_eq!(err.progress(), Some((2, 5)));
    }

    #[test]
    fn test_hint_by_status() {
        assert!(remediation_hint(401).contains("API key"));
        assert!(remediation_hint(429).contains("Rate limited"));
        assert!(remediation_hint(503).contains("Upstream service"));
        assert!(BackendError::new(Provider::Gemini, "offline").hint().contains("network"));
        assert!(BackendError::fatal(Provider::Gemini, "no key").hint().contains("API key"));
    }

    #[test]
    fn test_backend_error_display() {
        let err = BackendError::with_status(Provider::OpenAi, 429, "slow down");
        assert_eq!(err.to_string(), "OpenAI API error (429): slow down");
    }
}
