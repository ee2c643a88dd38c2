//! # Transfer Log
//!
//! The only state the engine persists: a mapping from item id to the
//! metadata of its last successful transfer. Presence of an entry means a
//! completed transfer; absence means never transferred. Entries are
//! overwritten, never appended.
//!
//! The log is loaded once at run start, mutated in memory as item pipelines
//! complete, and written back once at run end. The write replaces the whole
//! file via a temp file in the same directory followed by a rename, so a
//! crash mid-save never leaves a truncated log behind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, SideloadError};
use crate::model::{DownloadInfo, ItemId};

/// Persisted record of an item's last successful transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferLogEntry {
    /// Fingerprint of the asset at the time of transfer.
    pub fingerprint: String,
    /// The store's upload id at the time of transfer.
    pub upload_id: u64,
    /// Asset filename at the time of transfer.
    pub filename: String,
    /// When the transfer completed.
    pub transferred_at: DateTime<Utc>,
}

impl TransferLogEntry {
    /// Build an entry from the download metadata carried through a
    /// successful pipeline, stamped with the current time.
    pub fn from_info(info: &DownloadInfo) -> Self {
        Self {
            fingerprint: info.fingerprint.clone(),
            upload_id: info.upload_id,
            filename: info.filename.clone(),
            transferred_at: Utc::now(),
        }
    }
}

/// In-memory transfer log: `item id → last transferred entry`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransferLog {
    entries: HashMap<ItemId, TransferLogEntry>,
}

impl TransferLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ItemId) -> Option<&TransferLogEntry> {
        self.entries.get(&id)
    }

    /// Record a completed transfer, overwriting any prior entry for the id.
    pub fn record(&mut self, id: ItemId, entry: TransferLogEntry) {
        self.entries.insert(id, entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Durable storage for the transfer log.
pub struct TransferLogStore {
    path: PathBuf,
}

impl TransferLogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn store_error(&self, message: impl std::fmt::Display) -> SideloadError {
        SideloadError::LogStore {
            path: self.path.clone(),
            message: message.to_string(),
        }
    }

    /// Load the log, returning an empty mapping if the file does not exist.
    pub async fn load(&self) -> Result<TransferLog> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No transfer log yet; starting empty");
                return Ok(TransferLog::new());
            }
            Err(e) => return Err(self.store_error(e)),
        };

        serde_json::from_slice(&bytes).map_err(|e| self.store_error(e))
    }

    /// Replace the whole log on disk.
    ///
    /// Writes to `<path>.tmp` and renames over the target, so readers never
    /// observe a partial write.
    pub async fn save(&self, log: &TransferLog) -> Result<()> {
        let json = serde_json::to_vec_pretty(log).map_err(|e| self.store_error(e))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| self.store_error(e))?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &json)
            .await
            .map_err(|e| self.store_error(e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.store_error(e))?;

        debug!(path = %self.path.display(), entries = log.len(), "Transfer log saved");
        Ok(())
    }
}
