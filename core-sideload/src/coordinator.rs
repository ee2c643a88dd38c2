//! # Sideload Coordinator
//!
//! ## Overview
//!
//! Top-level orchestration of one sideload run:
//!
//! 1. Load the transfer log.
//! 2. Page through the candidate universe and the owned catalog, and fetch
//!    the installed catalog.
//! 3. Classify every owned item (update / add / skip).
//! 4. Run the selected transfers through the bounded executor.
//! 5. Save the log once and emit the final counters.
//!
//! Catalog failures abort the run before anything is transferred; the log
//! file on disk is untouched. Per-item failures are aggregated into the
//! [`RunReport`] and never stop siblings.
//!
//! ## Usage
//!
//! ```ignore
//! let coordinator = SideloadCoordinator::new(config, collaborators, events);
//! let mut rx = coordinator.events().subscribe();
//! let report = coordinator.run().await?;
//! ```

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use bridge_traits::FileStore;

use crate::config::RunConfig;
use crate::error::{Result, SideloadError};
use crate::events::{EventBus, SideloadEvent};
use crate::executor::TransferExecutor;
use crate::model::{InstalledEntry, OwnedItem};
use crate::reconcile::{classify, ReconcilePlan};
use crate::report::RunReport;
use crate::traits::{
    AssetDownloader, AssetUploader, CandidateUniverse, InstalledCatalogSource, OwnedCatalogSource,
};
use crate::transfer_log::TransferLogStore;

/// Upper bound on catalog pagination. A source that never terminates its
/// pagination is misbehaving; abort instead of looping forever.
const MAX_CATALOG_PAGES: u32 = 512;

/// The collaborator set one run operates on.
pub struct Collaborators {
    pub owned: Arc<dyn OwnedCatalogSource>,
    pub candidates: Arc<dyn CandidateUniverse>,
    pub installed: Arc<dyn InstalledCatalogSource>,
    pub downloader: Arc<dyn AssetDownloader>,
    pub uploader: Arc<dyn AssetUploader>,
    pub file_store: Arc<dyn FileStore>,
}

/// Orchestrates a full reconcile-and-transfer run.
pub struct SideloadCoordinator {
    config: RunConfig,
    collaborators: Collaborators,
    events: EventBus,
}

impl SideloadCoordinator {
    pub fn new(config: RunConfig, collaborators: Collaborators, events: EventBus) -> Self {
        Self {
            config,
            collaborators,
            events,
        }
    }

    /// The bus this coordinator reports progress on.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    fn emit(&self, event: SideloadEvent) {
        // Fire-and-forget; no subscriber is fine.
        self.events.emit(event).ok();
    }

    fn system(&self, message: impl Into<String>) {
        self.emit(SideloadEvent::System {
            message: message.into(),
        });
    }

    /// Run one full sideload pass.
    #[instrument(skip_all, fields(dry_run = self.config.dry_run))]
    pub async fn run(&self) -> Result<RunReport> {
        let log_store = TransferLogStore::new(&self.config.log_path);
        let mut log = log_store.load().await?;
        debug!(entries = log.len(), "Transfer log loaded");

        self.system("Loading catalogs");
        let candidate_names = self.fetch_candidate_names().await?;
        let owned = self.fetch_owned_catalog().await?;
        let installed = self.fetch_installed_catalog().await?;

        let plan = classify(
            owned,
            &candidate_names,
            &installed,
            &log,
            &*self.collaborators.downloader,
        )
        .await;

        for item in &plan.skipped {
            self.emit(SideloadEvent::Skip {
                title: item.title.clone(),
            });
        }

        if self.config.dry_run {
            return Ok(self.finish_dry_run(plan));
        }

        let executor = TransferExecutor::new(
            Arc::clone(&self.collaborators.downloader),
            Arc::clone(&self.collaborators.uploader),
            Arc::clone(&self.collaborators.file_store),
            self.events.clone(),
            self.config.concurrency,
        );

        let skipped = plan.skipped.len() as u64;
        let mut failures = plan.failures.clone();
        let transfers: Vec<_> = plan.to_update.into_iter().chain(plan.to_add).collect();

        let outcome = executor.execute(transfers, &mut log).await;
        failures.extend(outcome.failures);

        // One write per run, after all pipelines have settled.
        log_store.save(&log).await?;

        let report = RunReport {
            added: outcome.added,
            updated: outcome.updated,
            skipped,
            failures,
        };
        self.emit(SideloadEvent::Done {
            added: report.added,
            updated: report.updated,
            skipped: report.skipped,
            failed: report.failed(),
        });
        info!(
            added = report.added,
            updated = report.updated,
            skipped = report.skipped,
            failed = report.failed(),
            "Sideload run complete"
        );
        Ok(report)
    }

    /// Dry run: report what would happen, transfer nothing, write nothing.
    fn finish_dry_run(&self, plan: ReconcilePlan) -> RunReport {
        let report = RunReport {
            added: plan.to_add.len() as u64,
            updated: plan.to_update.len() as u64,
            skipped: plan.skipped.len() as u64,
            failures: plan.failures,
        };
        self.emit(SideloadEvent::Done {
            added: report.added,
            updated: report.updated,
            skipped: report.skipped,
            failed: report.failed(),
        });
        info!(
            would_add = report.added,
            would_update = report.updated,
            skipped = report.skipped,
            "Dry run complete"
        );
        report
    }

    /// Collect the full candidate universe, paging until a page reports
    /// zero items.
    async fn fetch_candidate_names(&self) -> Result<HashSet<String>> {
        let mut names = HashSet::new();
        for page in 1..=MAX_CATALOG_PAGES {
            let batch = self.collaborators.candidates.page(page).await?;
            if batch.num_items == 0 {
                debug!(pages = page - 1, titles = names.len(), "Candidate universe fetched");
                return Ok(names);
            }
            names.extend(batch.titles);
        }
        Err(SideloadError::Catalog(format!(
            "candidate universe did not terminate within {MAX_CATALOG_PAGES} pages"
        )))
    }

    /// Collect the owned catalog, paging until an empty page comes back.
    async fn fetch_owned_catalog(&self) -> Result<Vec<OwnedItem>> {
        let mut owned = Vec::new();
        for page in 1..=MAX_CATALOG_PAGES {
            let batch = self.collaborators.owned.page(page).await?;
            if batch.is_empty() {
                debug!(pages = page - 1, items = owned.len(), "Owned catalog fetched");
                return Ok(owned);
            }
            owned.extend(batch);
        }
        Err(SideloadError::Catalog(format!(
            "owned catalog did not terminate within {MAX_CATALOG_PAGES} pages"
        )))
    }

    async fn fetch_installed_catalog(&self) -> Result<Vec<InstalledEntry>> {
        let installed = self.collaborators.installed.installed_entries().await?;
        if installed.is_empty() {
            warn!("Installed catalog is empty; every eligible item will be a first install");
        }
        Ok(installed)
    }
}
