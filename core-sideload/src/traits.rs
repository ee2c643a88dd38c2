//! Collaborator seams consumed by the engine.
//!
//! The coordinator drives pagination itself: page methods are fetched with
//! increasing page numbers until the terminating page (zero items) comes
//! back. Retry policy for flaky pages lives in the collaborator, not here;
//! a page error surfaces as [`SideloadError::Catalog`] and aborts the run.
//!
//! [`SideloadError::Catalog`]: crate::error::SideloadError::Catalog

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::model::{CandidatePage, DownloadInfo, InstalledEntry, OwnedItem};

/// Source of the "owned items" catalog, paginated.
#[async_trait]
pub trait OwnedCatalogSource: Send + Sync {
    /// Fetch one page (1-based). An empty page terminates pagination.
    async fn page(&self, page: u32) -> Result<Vec<OwnedItem>>;
}

/// Source of the candidate universe: the titles eligible for transfer.
#[async_trait]
pub trait CandidateUniverse: Send + Sync {
    /// Fetch one page (1-based). A page with `num_items == 0` terminates
    /// pagination.
    async fn page(&self, page: u32) -> Result<CandidatePage>;
}

/// Source of the items currently present on the device service.
#[async_trait]
pub trait InstalledCatalogSource: Send + Sync {
    async fn installed_entries(&self) -> Result<Vec<InstalledEntry>>;
}

/// Per-item download operations against the store.
#[async_trait]
pub trait AssetDownloader: Send + Sync {
    /// Fetch the current upload metadata (fingerprint, filename) for an item.
    async fn download_info(&self, item: &OwnedItem) -> Result<DownloadInfo>;

    /// Download the asset to local staging, returning its path.
    async fn download(&self, item: &OwnedItem, info: &DownloadInfo) -> Result<PathBuf>;
}

/// Upload of a staged asset to the device service.
#[async_trait]
pub trait AssetUploader: Send + Sync {
    async fn upload(&self, path: &Path) -> Result<()>;
}
