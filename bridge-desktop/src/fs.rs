//! File Staging Implementation using Tokio fs

use async_trait::async_trait;
use bridge_traits::{error::Result, fs::FileStore};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Tokio-fs backed staging area.
///
/// All staged assets live under a single root directory; filenames are the
/// asset filenames reported by the store, which are unique per item.
pub struct TokioFileStore {
    root: PathBuf,
}

impl TokioFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl FileStore for TokioFileStore {
    async fn staging_dir(&self) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(self.root.clone())
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        Ok(tokio::fs::try_exists(path).await?)
    }

    async fn remove_file(&self, path: &Path) -> Result<()> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                debug!(path = %path.display(), "Removed staged file");
                Ok(())
            }
            // Already gone is fine; the cleanup path calls this unconditionally.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_staging_dir_created() {
        let tmp = tempfile::tempdir().unwrap();
        let store = TokioFileStore::new(tmp.path().join("staging"));

        let dir = store.staging_dir().await.unwrap();
        assert!(dir.exists());
    }

    #[tokio::test]
    async fn test_remove_file_tolerates_absent() {
        let tmp = tempfile::tempdir().unwrap();
        let store = TokioFileStore::new(tmp.path());

        let missing = tmp.path().join("never-written.pdx.zip");
        store.remove_file(&missing).await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_file_deletes() {
        let tmp = tempfile::tempdir().unwrap();
        let store = TokioFileStore::new(tmp.path());

        let path = tmp.path().join("asset.pdx.zip");
        tokio::fs::write(&path, b"bytes").await.unwrap();
        assert!(store.exists(&path).await.unwrap());

        store.remove_file(&path).await.unwrap();
        assert!(!store.exists(&path).await.unwrap());
    }
}
