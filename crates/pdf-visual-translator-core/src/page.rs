//! Page-level records passed between the pipeline stages.

use serde::{Deserialize, Serialize};

/// Extracted text for one source page.
///
/// `text` holds newline-separated reading-order lines, whitespace-normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    /// 1-based page number
    pub page_number: usize,
    pub text: String,
}

impl PageRecord {
    pub fn new(page_number: usize, text: impl Into<String>) -> Self {
        Self {
            page_number,
            text: text.into(),
        }
    }
}

/// A translated page, with the source text kept for checkpoints and previews.
///
/// This is also the per-page entry of a persisted checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatedPageRecord {
    pub page_number: usize,
    pub original_text: String,
    pub translated_text: String,
}

impl TranslatedPageRecord {
    pub fn new(source: &PageRecord, translated_text: impl Into<String>) -> Self {
        Self {
            page_number: source.page_number,
            original_text: source.text.clone(),
            translated_text: translated_text.into(),
        }
    }
}
