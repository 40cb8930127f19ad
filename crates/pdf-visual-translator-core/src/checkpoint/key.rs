use crate::config::Provider;

/// Identifies one checkpoint slot: a caller-chosen document id per provider.
///
/// The storage form is an MD5 hash of both parts, so arbitrary ids (paths,
/// URLs, uploaded file names) map to fixed-length keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentKey {
    pub document_id: String,
    pub provider: Provider,
}

impl DocumentKey {
    pub fn new(document_id: impl Into<String>, provider: Provider) -> Self {
        Self {
            document_id: document_id.into(),
            provider,
        }
    }

    /// Fixed-length storage key.
    pub fn storage_key(&self) -> String {
        // Null byte separator keeps ("ab", "c") and ("a", "bc") apart
        let combined = format!("{}\0{}", self.provider.id(), self.document_id);
        format!("{:x}", md5::compute(combined.as_bytes()))
    }
}

impl std::fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.document_id, self.provider.id())
    }
}
