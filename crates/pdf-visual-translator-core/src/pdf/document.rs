use std::path::Path;
use std::sync::Arc;

use mupdf::Document as MuDocument;

use crate::error::{Error, Result};

/// Largest accepted input document.
pub const MAX_INPUT_BYTES: usize = 50 * 1024 * 1024;

/// Leading bytes every accepted input must carry.
pub const PDF_SIGNATURE: &[u8] = b"%PDF-";

/// Immutable source document shared by extraction, rasterization and composition.
pub struct PdfDocument {
    /// The raw PDF bytes, never modified
    bytes: Arc<Vec<u8>>,
    /// Name the document was uploaded or opened under
    file_name: String,
    /// Number of pages
    page_count: usize,
    /// MD5 hex of the bytes, computed once on load
    fingerprint: String,
}

/// Check size and signature before handing bytes to the parser.
pub fn validate_input(bytes: &[u8]) -> Result<()> {
    if bytes.len() > MAX_INPUT_BYTES {
        return Err(Error::InvalidInput(format!(
            "document is {} bytes, limit is {} bytes",
            bytes.len(),
            MAX_INPUT_BYTES
        )));
    }
    if !bytes.starts_with(PDF_SIGNATURE) {
        return Err(Error::InvalidInput("missing %PDF- signature".to_string()));
    }
    Ok(())
}

impl PdfDocument {
    /// Open a PDF from bytes
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        validate_input(&bytes)?;

        let doc = MuDocument::from_bytes(&bytes, "").map_err(|e| Error::Extraction {
            page: None,
            reason: format!("failed to parse PDF: {e}"),
        })?;

        let page_count = doc.page_count().map_err(|e| Error::Extraction {
            page: None,
            reason: format!("failed to get page count: {e}"),
        })?;

        let fingerprint = format!("{:x}", md5::compute(&bytes));

        Ok(Self {
            bytes: Arc::new(bytes),
            file_name: "document.pdf".to_string(),
            page_count: usize::try_from(page_count).unwrap_or(0),
            fingerprint,
        })
    }

    /// Open a PDF from a file path
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| Error::Extraction {
            page: None,
            reason: format!("failed to read file {}: {}", path.display(), e),
        })?;

        let doc = Self::from_bytes(bytes)?;
        Ok(match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => doc.with_file_name(name),
            None => doc,
        })
    }

    #[must_use]
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Get number of pages
    pub const fn page_count(&self) -> usize {
        self.page_count
    }

    /// Open a fresh MuPDF handle over the shared bytes.
    ///
    /// Each caller gets its own handle, so rasterization and extraction can
    /// run side by side without sharing parser state.
    pub(crate) fn open_document(&self) -> Result<MuDocument> {
        MuDocument::from_bytes(&self.bytes, "").map_err(|e| Error::Extraction {
            page: None,
            reason: format!("failed to open document: {e}"),
        })
    }

    /// Content fingerprint (MD5 hex of the PDF bytes).
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

impl Clone for PdfDocument {
    /// O(1): only the `Arc` around the bytes is cloned.
    fn clone(&self) -> Self {
        Self {
            bytes: Arc::clone(&self.bytes),
            file_name: self.file_name.clone(),
            page_count: self.page_count,
            fingerprint: self.fingerprint.clone(),
        }
    }
}

impl std::fmt::Debug for PdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfDocument")
            .field("file_name", &self.file_name)
            .field("page_count", &self.page_count)
            .field("bytes_len", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_missing_signature() {
        assert!(matches!(
            validate_input(b"GIF89a..."),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_rejects_oversized_input() {
        let mut bytes = PDF_SIGNATURE.to_vec();
        bytes.resize(MAX_INPUT_BYTES + 1, b' ');
        assert!(matches!(validate_input(&bytes), Err(Error::InvalidInput(msg)) if msg.contains("limit")));
    }

    #[test]
    fn test_accepts_signature() {
        assert!(validate_input(b"%PDF-1.5\n").is_ok());
    }

    #[test]
    fn test_garbage_after_signature_yields_no_pages() {
        // MuPDF may repair its way to an empty document instead of failing
        let result = PdfDocument::from_bytes(b"%PDF-1.5 not really a pdf".to_vec());
        assert!(result.map_or(true, |doc| doc.page_count() == 0));
    }
}
