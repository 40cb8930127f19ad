use moka::future::Cache;

use super::model::Checkpoint;

/// Upper bound on checkpoints held in memory at once.
const MAX_ENTRIES: u64 = 256;

/// In-memory checkpoint layer using moka.
///
/// Expiry is decided by the checkpoint's own timestamp, not by moka, so
/// that both layers agree on what is stale.
pub struct MemoryStore {
    cache: Cache<String, Checkpoint>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            cache: Cache::builder().max_capacity(MAX_ENTRIES).build(),
        }
    }

    pub async fn get(&self, key: &str) -> Option<Checkpoint> {
        self.cache.get(key).await
    }

    pub async fn insert(&self, key: String, value: Checkpoint) {
        self.cache.insert(key, value).await;
    }

    pub async fn remove(&self, key: &str) {
        self.cache.remove(key).await;
    }

    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}
