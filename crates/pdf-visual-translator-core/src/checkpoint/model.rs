use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::key::DocumentKey;
use crate::config::Provider;
use crate::page::TranslatedPageRecord;
use crate::pdf::PdfDocument;
use crate::util::now_millis;

/// Translated prefix of one document, as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub document_id: String,
    pub provider: Provider,
    pub file_name: String,
    /// MD5 of the source bytes
    pub fingerprint: String,
    pub total_pages: usize,
    /// Unix milliseconds of the last write
    pub timestamp: u64,
    /// Ascending by page number, no duplicates
    pub pages: Vec<TranslatedPageRecord>,
}

impl Checkpoint {
    /// Snapshot `pages` for `doc`, stamped now.
    pub fn new(key: &DocumentKey, doc: &PdfDocument, pages: &[TranslatedPageRecord]) -> Self {
        let mut pages = pages.to_vec();
        pages.sort_by_key(|p| p.page_number);
        pages.dedup_by_key(|p| p.page_number);

        Self {
            document_id: key.document_id.clone(),
            provider: key.provider,
            file_name: doc.file_name().to_string(),
            fingerprint: doc.fingerprint().to_string(),
            total_pages: doc.page_count(),
            timestamp: now_millis(),
            pages,
        }
    }

    pub fn key(&self) -> DocumentKey {
        DocumentKey::new(self.document_id.clone(), self.provider)
    }

    /// Older than `ttl` at `now` (Unix milliseconds).
    pub fn is_expired(&self, ttl: Duration, now: u64) -> bool {
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        now.saturating_sub(self.timestamp) > ttl_ms
    }

    /// Whether this checkpoint was taken from the same document content.
    pub fn matches(&self, doc: &PdfDocument) -> bool {
        self.fingerprint == doc.fingerprint() && self.total_pages == doc.page_count()
    }

    pub fn completed(&self) -> usize {
        self.pages.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample(timestamp: u64) -> Checkpoint {
        Checkpoint {
            document_id: "doc".to_string(),
            provider: Provider::DeepSeek,
            file_name: "doc.pdf".to_string(),
            fingerprint: "abc".to_string(),
            total_pages: 3,
            timestamp,
            pages: vec![TranslatedPageRecord {
                page_number: 1,
                original_text: "Hello".to_string(),
                translated_text: "Olá".to_string(),
            }],
        }
    }

    #[test]
    fn test_expiry() {
        let day = Duration::from_secs(24 * 60 * 60);
        let checkpoint = sample(1_000);
        assert!(!checkpoint.is_expired(day, 1_000));
        assert!(!checkpoint.is_expired(day, 1_000 + 86_400_000));
        assert!(checkpoint.is_expired(day, 1_000 + 86_400_001));
        // Clock skew backwards never expires
        assert!(!checkpoint.is_expired(day, 0));
    }

    #[test]
    fn test_persisted_layout() {
        let value = serde_json::to_value(sample(42)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "documentId": "doc",
                "provider": "deepseek",
                "fileName": "doc.pdf",
                "fingerprint": "abc",
                "totalPages": 3,
                "timestamp": 42,
                "pages": [{"pageNumber": 1, "originalText": "Hello", "translatedText": "Olá"}]
            })
        );
    }
}
