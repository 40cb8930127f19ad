use sled::Db;
use std::path::Path;
use tracing::{debug, warn};

use super::model::Checkpoint;
use crate::error::{Error, Result};

/// Disk-based checkpoint layer using sled, one JSON record per key.
pub struct DiskStore {
    db: Db,
}

impl DiskStore {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::Checkpoint(format!(
                    "failed to create checkpoint directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let db = sled::open(path).map_err(|e| {
            let err_str = e.to_string();
            // Detect lock errors and provide actionable fix
            if err_str.contains("WouldBlock") || err_str.contains("lock") {
                Error::Checkpoint(format!(
                    "checkpoint store locked at {}\n\n\
                    Another translation is running, or a previous one crashed.\n\
                    To fix: rm {}/db/LOCK",
                    path.display(),
                    path.display()
                ))
            } else {
                Error::Checkpoint(format!("failed to open checkpoint store at {}: {}", path.display(), e))
            }
        })?;

        debug!("Opened checkpoint store at {}", path.display());

        Ok(Self { db })
    }

    /// Read a record. Unreadable records are dropped and reported as absent.
    pub fn get(&self, key: &str) -> Result<Option<Checkpoint>> {
        let Some(bytes) = self
            .db
            .get(key.as_bytes())
            .map_err(|e| Error::Checkpoint(format!("read failed: {e}")))?
        else {
            return Ok(None);
        };

        match serde_json::from_slice(&bytes) {
            Ok(checkpoint) => Ok(Some(checkpoint)),
            Err(e) => {
                warn!("Discarding unreadable checkpoint {}: {}", key, e);
                self.remove(key)?;
                Ok(None)
            }
        }
    }

    pub fn insert(&self, key: &str, value: &Checkpoint) -> Result<()> {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| Error::Checkpoint(format!("failed to serialize checkpoint: {e}")))?;

        self.db
            .insert(key.as_bytes(), bytes)
            .map_err(|e| Error::Checkpoint(format!("write failed: {e}")))?;
        self.flush()
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        self.db
            .remove(key.as_bytes())
            .map_err(|e| Error::Checkpoint(format!("remove failed: {e}")))?;
        self.flush()
    }

    pub fn clear(&self) -> Result<()> {
        self.db
            .clear()
            .map_err(|e| Error::Checkpoint(format!("clear failed: {e}")))?;
        self.flush()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    /// Flush to ensure persistence
    fn flush(&self) -> Result<()> {
        self.db
            .flush()
            .map_err(|e| Error::Checkpoint(format!("flush failed: {e}")))?;
        Ok(())
    }
}
