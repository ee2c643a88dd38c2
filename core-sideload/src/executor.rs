//! # Transfer Executor
//!
//! Runs the per-item transfer pipeline for every selected item:
//! fetch metadata (unless classification already did) → download to staging
//! → upload → remove the staged file → record the log entry.
//!
//! One semaphore-bounded `JoinSet` processes updates and first installs
//! alike; at most `concurrency` pipelines are in flight at once. Failures
//! are isolated per item: a failed or panicked task is turned into an
//! [`ItemFailure`] and its siblings keep running. Log entries are applied by
//! the driver as tasks complete; keys are disjoint within a run, so the
//! mutations commute.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};

use bridge_traits::FileStore;

use crate::error::{Result, SideloadError};
use crate::events::{EventBus, SideloadEvent};
use crate::model::{DownloadInfo, ItemId, OwnedItem};
use crate::reconcile::{PlannedTransfer, TransferKind};
use crate::report::ItemFailure;
use crate::traits::{AssetDownloader, AssetUploader};
use crate::transfer_log::{TransferLog, TransferLogEntry};

/// Counters and failures from one executor pass.
#[derive(Debug, Default)]
pub struct ExecutorOutcome {
    pub added: u64,
    pub updated: u64,
    pub failures: Vec<ItemFailure>,
}

struct ItemOutcome {
    id: ItemId,
    title: String,
    kind: TransferKind,
    result: std::result::Result<TransferLogEntry, String>,
}

/// Executes transfer pipelines under a bounded concurrency cap.
pub struct TransferExecutor {
    downloader: Arc<dyn AssetDownloader>,
    uploader: Arc<dyn AssetUploader>,
    file_store: Arc<dyn FileStore>,
    events: EventBus,
    concurrency: usize,
}

impl TransferExecutor {
    pub fn new(
        downloader: Arc<dyn AssetDownloader>,
        uploader: Arc<dyn AssetUploader>,
        file_store: Arc<dyn FileStore>,
        events: EventBus,
        concurrency: usize,
    ) -> Self {
        Self {
            downloader,
            uploader,
            file_store,
            events,
            concurrency,
        }
    }

    /// Run every selected transfer, updating the in-memory log as pipelines
    /// complete. Successful items get their log entry recorded; failed items
    /// are excluded so the next run retries them.
    #[instrument(skip_all, fields(selected = transfers.len(), concurrency = self.concurrency))]
    pub async fn execute(
        &self,
        transfers: Vec<PlannedTransfer>,
        log: &mut TransferLog,
    ) -> ExecutorOutcome {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks: JoinSet<ItemOutcome> = JoinSet::new();
        let mut task_items: HashMap<tokio::task::Id, (ItemId, String, TransferKind)> =
            HashMap::new();

        for planned in transfers {
            let semaphore = Arc::clone(&semaphore);
            let downloader = Arc::clone(&self.downloader);
            let uploader = Arc::clone(&self.uploader);
            let file_store = Arc::clone(&self.file_store);
            let events = self.events.clone();

            let key = (planned.item.id, planned.item.title.clone(), planned.kind);
            let handle = tasks.spawn(async move {
                let id = planned.item.id;
                let title = planned.item.title.clone();
                let kind = planned.kind;

                let permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return ItemOutcome {
                            id,
                            title,
                            kind,
                            result: Err("concurrency pool closed".to_string()),
                        }
                    }
                };

                let start_event = match kind {
                    TransferKind::FirstInstall => SideloadEvent::Sideload {
                        title: title.clone(),
                    },
                    TransferKind::Update => SideloadEvent::Update {
                        title: title.clone(),
                    },
                };
                events.emit(start_event).ok();

                let result =
                    run_pipeline(&*downloader, &*uploader, &*file_store, &planned.item, planned.info)
                        .await
                        .map_err(|e| e.to_string());

                drop(permit);
                ItemOutcome {
                    id,
                    title,
                    kind,
                    result,
                }
            });
            task_items.insert(handle.id(), key);
        }

        let mut outcome = ExecutorOutcome::default();

        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((task_id, item)) => {
                    task_items.remove(&task_id);
                    match item.result {
                        Ok(entry) => {
                            log.record(item.id, entry);
                            match item.kind {
                                TransferKind::FirstInstall => outcome.added += 1,
                                TransferKind::Update => outcome.updated += 1,
                            }
                            debug!(id = %item.id, title = %item.title, "Transfer complete");
                        }
                        Err(message) => {
                            self.events
                                .emit(SideloadEvent::ItemFailed {
                                    title: item.title.clone(),
                                    message: message.clone(),
                                })
                                .ok();
                            outcome.failures.push(ItemFailure {
                                id: item.id,
                                title: item.title,
                                message,
                            });
                        }
                    }
                }
                Err(join_err) => {
                    // A panicked pipeline aborts only its own task; attribute
                    // it through the task id map and keep draining siblings.
                    let (id, title, _kind) = task_items
                        .remove(&join_err.id())
                        .unwrap_or_else(|| (ItemId(0), "<unknown>".to_string(), TransferKind::FirstInstall));
                    warn!(id = %id, title = %title, error = %join_err, "Transfer task aborted");
                    self.events
                        .emit(SideloadEvent::ItemFailed {
                            title: title.clone(),
                            message: join_err.to_string(),
                        })
                        .ok();
                    outcome.failures.push(ItemFailure {
                        id,
                        title,
                        message: join_err.to_string(),
                    });
                }
            }
        }

        outcome
    }
}

/// The per-item pipeline.
///
/// The staged file is removed whether the upload succeeds or fails; a
/// cleanup failure is logged and never masks the transfer result.
async fn run_pipeline(
    downloader: &dyn AssetDownloader,
    uploader: &dyn AssetUploader,
    file_store: &dyn FileStore,
    item: &OwnedItem,
    info: Option<DownloadInfo>,
) -> Result<TransferLogEntry> {
    let info = match info {
        Some(info) => info,
        None => downloader.download_info(item).await?,
    };

    let staged = downloader.download(item, &info).await?;

    let upload_result = uploader
        .upload(&staged)
        .await
        .map_err(|e| SideloadError::Asset(format!("upload of {}: {}", item.title, e)));

    if let Err(e) = file_store.remove_file(&staged).await {
        warn!(path = %staged.display(), error = %e, "Failed to remove staged asset");
    }

    upload_result?;
    Ok(TransferLogEntry::from_info(&info))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    struct StubDownloader {
        dir: PathBuf,
        fingerprint: String,
    }

    #[async_trait]
    impl AssetDownloader for StubDownloader {
        async fn download_info(&self, item: &OwnedItem) -> Result<DownloadInfo> {
            Ok(DownloadInfo {
                fingerprint: self.fingerprint.clone(),
                upload_id: 1,
                filename: format!("{}.pdx.zip", item.id),
            })
        }

        async fn download(&self, _item: &OwnedItem, info: &DownloadInfo) -> Result<PathBuf> {
            let path = self.dir.join(&info.filename);
            tokio::fs::write(&path, b"asset")
                .await
                .map_err(|e| SideloadError::Asset(e.to_string()))?;
            Ok(path)
        }
    }

    struct StubUploader {
        reject: Vec<String>,
        uploaded: Mutex<Vec<PathBuf>>,
    }

    #[async_trait]
    impl AssetUploader for StubUploader {
        async fn upload(&self, path: &Path) -> Result<()> {
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            if self.reject.contains(&name) {
                return Err(SideloadError::Asset("rejected by portal".to_string()));
            }
            self.uploaded.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
    }

    struct TempStore {
        root: PathBuf,
    }

    #[async_trait]
    impl FileStore for TempStore {
        async fn staging_dir(&self) -> bridge_traits::Result<PathBuf> {
            Ok(self.root.clone())
        }

        async fn exists(&self, path: &Path) -> bridge_traits::Result<bool> {
            Ok(path.exists())
        }

        async fn remove_file(&self, path: &Path) -> bridge_traits::Result<()> {
            match tokio::fs::remove_file(path).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            }
        }
    }

    fn planned(id: u64, title: &str, kind: TransferKind) -> PlannedTransfer {
        PlannedTransfer {
            item: OwnedItem {
                id: ItemId(id),
                title: title.to_string(),
                download_key_id: id,
            },
            kind,
            info: None,
        }
    }

    fn executor(
        dir: &Path,
        reject: Vec<String>,
    ) -> (TransferExecutor, Arc<StubUploader>) {
        let uploader = Arc::new(StubUploader {
            reject,
            uploaded: Mutex::new(Vec::new()),
        });
        let executor = TransferExecutor::new(
            Arc::new(StubDownloader {
                dir: dir.to_path_buf(),
                fingerprint: "fp".to_string(),
            }),
            uploader.clone(),
            Arc::new(TempStore {
                root: dir.to_path_buf(),
            }),
            EventBus::new(64),
            2,
        );
        (executor, uploader)
    }

    #[tokio::test]
    async fn test_success_records_log_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let (executor, _) = executor(tmp.path(), vec![]);
        let mut log = TransferLog::new();

        let outcome = executor
            .execute(vec![planned(1, "Bloom", TransferKind::FirstInstall)], &mut log)
            .await;

        assert_eq!(outcome.added, 1);
        assert!(outcome.failures.is_empty());
        assert_eq!(log.get(ItemId(1)).unwrap().fingerprint, "fp");
    }

    #[tokio::test]
    async fn test_staged_file_removed_after_success() {
        let tmp = tempfile::tempdir().unwrap();
        let (executor, _) = executor(tmp.path(), vec![]);
        let mut log = TransferLog::new();

        executor
            .execute(vec![planned(1, "Bloom", TransferKind::FirstInstall)], &mut log)
            .await;

        assert!(!tmp.path().join("1.pdx.zip").exists());
    }

    #[tokio::test]
    async fn test_staged_file_removed_after_upload_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let (executor, _) = executor(tmp.path(), vec!["1.pdx.zip".to_string()]);
        let mut log = TransferLog::new();

        let outcome = executor
            .execute(vec![planned(1, "Bloom", TransferKind::FirstInstall)], &mut log)
            .await;

        assert_eq!(outcome.failures.len(), 1);
        assert!(log.get(ItemId(1)).is_none());
        assert!(!tmp.path().join("1.pdx.zip").exists());
    }

    #[tokio::test]
    async fn test_failure_does_not_abort_siblings() {
        let tmp = tempfile::tempdir().unwrap();
        let (executor, uploader) = executor(tmp.path(), vec!["2.pdx.zip".to_string()]);
        let mut log = TransferLog::new();

        let outcome = executor
            .execute(
                vec![
                    planned(1, "Bloom", TransferKind::FirstInstall),
                    planned(2, "Echoes", TransferKind::FirstInstall),
                    planned(3, "Orbit", TransferKind::Update),
                ],
                &mut log,
            )
            .await;

        assert_eq!(outcome.added, 1);
        assert_eq!(outcome.updated, 1);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].id, ItemId(2));
        assert_eq!(uploader.uploaded.lock().unwrap().len(), 2);
        assert!(log.get(ItemId(1)).is_some());
        assert!(log.get(ItemId(2)).is_none());
        assert!(log.get(ItemId(3)).is_some());
    }

    #[tokio::test]
    async fn test_emits_start_and_failure_events() {
        let tmp = tempfile::tempdir().unwrap();
        let uploader = Arc::new(StubUploader {
            reject: vec!["1.pdx.zip".to_string()],
            uploaded: Mutex::new(Vec::new()),
        });
        let events = EventBus::new(64);
        let mut rx = events.subscribe();
        let executor = TransferExecutor::new(
            Arc::new(StubDownloader {
                dir: tmp.path().to_path_buf(),
                fingerprint: "fp".to_string(),
            }),
            uploader,
            Arc::new(TempStore {
                root: tmp.path().to_path_buf(),
            }),
            events,
            1,
        );

        let mut log = TransferLog::new();
        executor
            .execute(vec![planned(1, "Bloom", TransferKind::FirstInstall)], &mut log)
            .await;

        let mut seen = Vec::new();
        while let Ok(event) = rx.try_recv() {
            seen.push(event);
        }
        assert!(matches!(seen[0], SideloadEvent::Sideload { .. }));
        assert!(matches!(seen[1], SideloadEvent::ItemFailed { .. }));
    }
}
