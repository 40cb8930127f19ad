mod disk;
mod key;
mod memory;
mod model;

pub use disk::DiskStore;
pub use key::DocumentKey;
pub use memory::MemoryStore;
pub use model::Checkpoint;

use std::time::Duration;
use tracing::{debug, info};

use crate::config::CheckpointConfig;
use crate::error::Result;
use crate::page::TranslatedPageRecord;
use crate::pdf::PdfDocument;
use crate::util::now_millis;

/// Combined checkpoint store with memory and disk layers
pub struct CheckpointStore {
    memory: Option<MemoryStore>,
    disk: Option<DiskStore>,
    ttl: Duration,
}

impl CheckpointStore {
    /// Create a new checkpoint store from configuration
    pub fn new(config: &CheckpointConfig) -> Result<Self> {
        let memory = config.memory_enabled.then(MemoryStore::new);

        let disk = if config.disk_enabled {
            let path = config
                .disk_path
                .clone()
                .unwrap_or_else(crate::util::checkpoint_path);
            Some(DiskStore::new(path)?)
        } else {
            None
        };

        Ok(Self {
            memory,
            disk,
            ttl: config.ttl(),
        })
    }

    /// A memory-only store with the default TTL.
    pub fn in_memory() -> Self {
        Self {
            memory: Some(MemoryStore::new()),
            disk: None,
            ttl: CheckpointConfig::default().ttl(),
        }
    }

    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Load the checkpoint for `key`.
    ///
    /// A checkpoint older than the TTL is removed and reported as absent.
    pub async fn get(&self, key: &DocumentKey) -> Result<Option<Checkpoint>> {
        let storage_key = key.storage_key();

        let mut found = None;
        if let Some(ref memory) = self.memory {
            found = memory.get(&storage_key).await;
        }

        if found.is_none()
            && let Some(ref disk) = self.disk
            && let Some(checkpoint) = disk.get(&storage_key)?
        {
            // Populate memory layer on disk hit
            if let Some(ref memory) = self.memory {
                memory.insert(storage_key.clone(), checkpoint.clone()).await;
            }
            found = Some(checkpoint);
        }

        match found {
            Some(checkpoint) if checkpoint.is_expired(self.ttl, now_millis()) => {
                info!("Discarding expired checkpoint for {}", key);
                self.clear(key).await?;
                Ok(None)
            }
            other => Ok(other),
        }
    }

    /// Store `pages` as the checkpoint for `key`, replacing any previous one.
    pub async fn put(&self, key: &DocumentKey, doc: &PdfDocument, pages: &[TranslatedPageRecord]) -> Result<()> {
        self.save(&Checkpoint::new(key, doc, pages)).await
    }

    /// Store a complete checkpoint record as-is.
    pub async fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        let key = checkpoint.key();
        let storage_key = key.storage_key();

        if let Some(ref disk) = self.disk {
            disk.insert(&storage_key, checkpoint)?;
        }

        if let Some(ref memory) = self.memory {
            memory.insert(storage_key, checkpoint.clone()).await;
        }

        debug!("Checkpoint for {} now holds {} pages", key, checkpoint.completed());
        Ok(())
    }

    /// Remove the checkpoint for `key`, if any.
    pub async fn clear(&self, key: &DocumentKey) -> Result<()> {
        let storage_key = key.storage_key();

        if let Some(ref memory) = self.memory {
            memory.remove(&storage_key).await;
        }

        if let Some(ref disk) = self.disk {
            disk.remove(&storage_key)?;
        }

        debug!("Cleared checkpoint for {}", key);
        Ok(())
    }

    /// Remove every checkpoint.
    pub fn clear_all(&self) -> Result<()> {
        if let Some(ref memory) = self.memory {
            memory.clear();
        }

        if let Some(ref disk) = self.disk {
            disk.clear()?;
        }

        info!("Cleared all checkpoints");
        Ok(())
    }
}
