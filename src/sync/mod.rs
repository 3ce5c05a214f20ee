//! Catalog synchronization engine.
//!
//! `service` drives one provider-to-store reconciliation per market,
//! `batch` partitions the mapped records and `worker_pool` upserts the
//! batches concurrently.

pub mod batch;
pub mod service;
pub mod worker_pool;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::database::DatabaseError;
use crate::providers::FetchError;

pub use batch::{split_into_batches, Batch};
pub use service::{SymbolSyncService, SyncOutcome};
pub use worker_pool::{BatchOutcome, SyncTotals, WorkerPool};

/// Sync engine tuning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncConfig {
    /// Records per upsert batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Maximum batches in flight
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_workers: default_max_workers(),
        }
    }
}

fn default_batch_size() -> usize {
    100
}

fn default_max_workers() -> usize {
    5
}

/// Hard sync failures
///
/// Per-batch upsert failures are never reported here; they are counted in
/// [`SyncTotals::errors`].
#[derive(Debug, Error)]
pub enum SyncError {
    /// Transport or decode failure talking to the catalog provider
    #[error("Catalog fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Sync worker failed: {0}")]
    WorkerFailed(String),

    #[error("Sync run incomplete: {reported} of {expected} batches reported")]
    IncompleteRun { expected: usize, reported: usize },

    #[error("Failed to read sync stats: {0}")]
    Stats(#[from] DatabaseError),
}
