//! Local File Staging Abstraction
//!
//! Downloaded assets live on disk only between download and upload; this seam
//! provides the staging directory and the cleanup primitive the transfer
//! pipeline relies on.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Access to the local staging area for in-flight assets.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Directory where downloaded assets are staged. Created if absent.
    async fn staging_dir(&self) -> Result<PathBuf>;

    /// Whether a path exists.
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Remove a staged file.
    ///
    /// Must succeed if the file is already absent; the cleanup path of the
    /// transfer pipeline calls this unconditionally.
    async fn remove_file(&self, path: &Path) -> Result<()>;
}
