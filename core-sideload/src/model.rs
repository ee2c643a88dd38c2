//! Data model shared between the engine and the provider crates.

use serde::{Deserialize, Serialize};

// ============================================================================
// ID Types
// ============================================================================

/// Stable identifier of an item in the owned catalog (the store's game id).
///
/// This is the join key against the transfer log. Installed entries on the
/// device side carry no shared identifier; they are matched by title instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ItemId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

// ============================================================================
// Catalog Snapshots
// ============================================================================

/// An entry in the owned catalog. Immutable snapshot for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedItem {
    pub id: ItemId,
    /// Human-readable title, used for fuzzy matching against installed names.
    pub title: String,
    /// Opaque reference the downloader needs to locate the asset
    /// (the store's download key id).
    pub download_key_id: u64,
}

/// An entry from the installed catalog on the device service.
///
/// Version and date are display-only strings scraped from the portal; there
/// is no stable identifier shared with [`OwnedItem`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledEntry {
    pub title: String,
    pub version: String,
    pub date: String,
}

/// Current upload metadata for an item, fetched once per selected item and
/// carried through the transfer pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadInfo {
    /// Content hash of the current uploadable asset.
    pub fingerprint: String,
    /// The store's upload id, needed to build the download URL.
    pub upload_id: u64,
    /// Asset filename; unique per item, used as the staging filename.
    pub filename: String,
}

/// One page of the candidate universe listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePage {
    pub titles: Vec<String>,
    /// Item count reported for the page; zero terminates pagination.
    pub num_items: u32,
}
