//! Run configuration.
//!
//! One [`RunConfig`] is scoped to one run; there is no process-wide state.
//! The builder validates fail-fast so a bad concurrency limit or empty log
//! path surfaces before any network call is made.

use std::path::PathBuf;

use crate::error::{Result, SideloadError};

/// Default number of concurrently in-flight item pipelines.
pub const DEFAULT_CONCURRENCY: usize = 6;

/// Configuration for a single sideload run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Path of the persisted transfer log.
    pub log_path: PathBuf,

    /// Maximum concurrently in-flight item pipelines.
    pub concurrency: usize,

    /// Reconcile and report only; no transfers, no log write.
    pub dry_run: bool,
}

impl RunConfig {
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder::default()
    }
}

/// Builder for [`RunConfig`].
#[derive(Debug, Default)]
pub struct RunConfigBuilder {
    log_path: Option<PathBuf>,
    concurrency: Option<usize>,
    dry_run: bool,
}

impl RunConfigBuilder {
    /// Sets the transfer log path (required).
    pub fn log_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Sets the concurrency limit. Default: 6.
    pub fn concurrency(mut self, limit: usize) -> Self {
        self.concurrency = Some(limit);
        self
    }

    /// Enables dry-run mode.
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    pub fn build(self) -> Result<RunConfig> {
        let log_path = self.log_path.ok_or_else(|| {
            SideloadError::Config(
                "Transfer log path is required. Use .log_path() to set it.".to_string(),
            )
        })?;

        if log_path.as_os_str().is_empty() {
            return Err(SideloadError::Config(
                "Transfer log path cannot be empty".to_string(),
            ));
        }

        let concurrency = self.concurrency.unwrap_or(DEFAULT_CONCURRENCY);
        if concurrency == 0 {
            return Err(SideloadError::Config(
                "Concurrency limit must be at least 1".to_string(),
            ));
        }

        Ok(RunConfig {
            log_path,
            concurrency,
            dry_run: self.dry_run,
        })
    }
}
