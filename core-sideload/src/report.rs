//! Run reporting types.

use serde::{Deserialize, Serialize};

use crate::model::ItemId;

/// A single item whose pipeline failed. The item stays out of the transfer
/// log, so the next run retries it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub id: ItemId,
    pub title: String,
    pub message: String,
}

/// Final counters for a run. Reporting only; never used for control
/// decisions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub added: u64,
    pub updated: u64,
    pub skipped: u64,
    pub failures: Vec<ItemFailure>,
}

impl RunReport {
    pub fn failed(&self) -> u64 {
        self.failures.len() as u64
    }
}
