//! # Sideload Engine
//!
//! Reconciles a purchased catalog against the items installed on a device
//! service and transfers whatever is missing or outdated.
//!
//! ## Overview
//!
//! One run moves through five phases:
//! - Loading the persisted transfer log
//! - Fetching the three catalog snapshots (owned, candidate universe,
//!   installed)
//! - Classifying every owned item as update, first install, or skip
//! - Running the selected transfers through a bounded concurrent pipeline
//! - Saving the log and reporting final counters
//!
//! ## Components
//!
//! - **Coordinator** (`coordinator`): Orchestrates the run phases
//! - **Reconciliation** (`reconcile`): Pure classification of owned items
//! - **Transfer Executor** (`executor`): Bounded download→upload pipelines
//!   with per-item failure isolation
//! - **Transfer Log** (`transfer_log`): The only persisted state, saved
//!   atomically once per run
//! - **Event Bus** (`events`): Broadcast progress reporting for front ends
//!
//! The engine talks to the outside world only through the seams in
//! `traits` plus the `FileStore` abstraction; provider crates supply the
//! concrete catalog sources and transfer endpoints.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod executor;
pub mod matching;
pub mod model;
pub mod reconcile;
pub mod report;
pub mod traits;
pub mod transfer_log;

pub use config::{RunConfig, RunConfigBuilder, DEFAULT_CONCURRENCY};
pub use coordinator::{Collaborators, SideloadCoordinator};
pub use error::{Result, SideloadError};
pub use events::{EventBus, SideloadEvent, DEFAULT_EVENT_BUFFER_SIZE};
pub use executor::{ExecutorOutcome, TransferExecutor};
pub use model::{CandidatePage, DownloadInfo, InstalledEntry, ItemId, OwnedItem};
pub use reconcile::{classify, PlannedTransfer, ReconcilePlan, TransferKind};
pub use report::{ItemFailure, RunReport};
pub use traits::{
    AssetDownloader, AssetUploader, CandidateUniverse, InstalledCatalogSource, OwnedCatalogSource,
};
pub use transfer_log::{TransferLog, TransferLogEntry, TransferLogStore};
