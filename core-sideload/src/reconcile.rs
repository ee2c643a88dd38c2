//! # Reconciliation
//!
//! Computes the add/update/skip decision set from the three catalog
//! snapshots plus the transfer log.
//!
//! Classification performs no mutation. Its single side effect on the
//! outside world is one `download_info` fetch per installed-matched item;
//! the result is carried on the plan so the executor never fetches it again.
//! A fetch failure sidelines just that item into the failure list.

use std::collections::HashSet;
use tracing::{debug, info, instrument};

use crate::matching::is_installed;
use crate::model::{DownloadInfo, InstalledEntry, OwnedItem};
use crate::report::ItemFailure;
use crate::traits::AssetDownloader;
use crate::transfer_log::TransferLog;

/// What kind of transfer an item needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    /// Not present on the device; first-time transfer.
    FirstInstall,
    /// Present on the device with a changed fingerprint.
    Update,
}

/// One selected item, with the download metadata when classification
/// already fetched it.
#[derive(Debug, Clone)]
pub struct PlannedTransfer {
    pub item: OwnedItem,
    pub kind: TransferKind,
    pub info: Option<DownloadInfo>,
}

/// The decision set for one run. The three item sets are disjoint.
#[derive(Debug, Clone, Default)]
pub struct ReconcilePlan {
    pub to_update: Vec<PlannedTransfer>,
    pub to_add: Vec<PlannedTransfer>,
    pub skipped: Vec<OwnedItem>,
    /// Items whose metadata fetch failed during classification.
    pub failures: Vec<ItemFailure>,
}

impl ReconcilePlan {
    /// Number of items selected for transfer.
    pub fn selected(&self) -> usize {
        self.to_update.len() + self.to_add.len()
    }
}

/// Classify the owned catalog against the installed catalog and the log.
///
/// Steps:
/// 1. Keep only owned items whose title appears verbatim in the candidate
///    universe.
/// 2. Partition by installed-ness (fuzzy title match).
/// 3. Installed items: fetch the current fingerprint and compare with the
///    logged one. Differing fingerprint → update; equal → skip; no log
///    entry → first install (an installed item we never transferred is
///    treated as fresh).
/// 4. Items absent from the device are first installs unconditionally;
///    their metadata is fetched later, inside the transfer pipeline.
#[instrument(skip_all, fields(owned = owned.len(), installed = installed.len()))]
pub async fn classify(
    owned: Vec<OwnedItem>,
    candidate_names: &HashSet<String>,
    installed: &[InstalledEntry],
    log: &TransferLog,
    downloader: &dyn AssetDownloader,
) -> ReconcilePlan {
    let mut plan = ReconcilePlan::default();

    let eligible: Vec<OwnedItem> = owned
        .into_iter()
        .filter(|item| candidate_names.contains(&item.title))
        .collect();
    debug!(eligible = eligible.len(), "Filtered owned catalog against candidate universe");

    for item in eligible {
        if !is_installed(&item, installed) {
            plan.to_add.push(PlannedTransfer {
                item,
                kind: TransferKind::FirstInstall,
                info: None,
            });
            continue;
        }

        let info = match downloader.download_info(&item).await {
            Ok(info) => info,
            Err(e) => {
                plan.failures.push(ItemFailure {
                    id: item.id,
                    title: item.title.clone(),
                    message: e.to_string(),
                });
                continue;
            }
        };

        match log.get(item.id) {
            None => plan.to_add.push(PlannedTransfer {
                item,
                kind: TransferKind::FirstInstall,
                info: Some(info),
            }),
            Some(entry) if entry.fingerprint != info.fingerprint => {
                plan.to_update.push(PlannedTransfer {
                    item,
                    kind: TransferKind::Update,
                    info: Some(info),
                })
            }
            Some(_) => plan.skipped.push(item),
        }
    }

    info!(
        updates = plan.to_update.len(),
        adds = plan.to_add.len(),
        skipped = plan.skipped.len(),
        failures = plan.failures.len(),
        "Reconciliation complete"
    );

    plan
}
