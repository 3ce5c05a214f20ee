use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

use super::batch::Batch;
use super::SyncError;
use crate::database::models::NewSymbol;
use crate::database::repositories::SymbolRepository;

/// Result of one batch upsert, emitted once by the worker that ran it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    pub batch_id: usize,
    pub success_count: usize,
    pub error_count: usize,
    pub error: Option<String>,
}

/// Aggregated result of a pool run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncTotals {
    pub batches: usize,
    pub success: usize,
    pub errors: usize,
    /// Batches that reported an error (wholly or partially failed)
    pub failed_batches: usize,
}

impl SyncTotals {
    fn absorb(&mut self, outcome: &BatchOutcome) {
        self.batches += 1;
        self.success += outcome.success_count;
        self.errors += outcome.error_count;
        if outcome.error.is_some() {
            self.failed_batches += 1;
        }
    }
}

type BatchQueue = Arc<Mutex<mpsc::Receiver<Batch<NewSymbol>>>>;

/// Bounded pool of upsert workers
///
/// At most `max_workers` batches are in flight. Workers pull from a shared
/// queue and report a [`BatchOutcome`] per batch; the calling task is the only
/// owner of the running totals.
pub struct WorkerPool {
    repository: Arc<dyn SymbolRepository>,
    max_workers: usize,
}

impl WorkerPool {
    pub fn new(repository: Arc<dyn SymbolRepository>, max_workers: usize) -> Self {
        Self {
            repository,
            max_workers: max_workers.max(1),
        }
    }

    /// Upsert every batch exactly once and return the summed counts
    ///
    /// Batch failures are folded into `errors`. An `Err` is returned only when
    /// a worker dies or not every batch produced an outcome.
    pub async fn run(&self, batches: Vec<Batch<NewSymbol>>) -> Result<SyncTotals, SyncError> {
        let expected = batches.len();
        if expected == 0 {
            return Ok(SyncTotals::default());
        }

        let worker_count = self.max_workers.min(expected);

        tracing::info!(
            batches = expected,
            workers = worker_count,
            "Starting batch upsert"
        );

        // Handoff blocks once every worker is busy and the queue is full
        let (batch_tx, batch_rx) = mpsc::channel::<Batch<NewSymbol>>(worker_count);
        let queue: BatchQueue = Arc::new(Mutex::new(batch_rx));
        let (outcome_tx, mut outcome_rx) = mpsc::channel::<BatchOutcome>(expected);

        let mut workers = JoinSet::new();
        for worker_id in 1..=worker_count {
            workers.spawn(run_worker(
                worker_id,
                Arc::clone(&queue),
                outcome_tx.clone(),
                Arc::clone(&self.repository),
            ));
        }
        // Outcome stream closes once the last worker exits
        drop(outcome_tx);

        let producer = tokio::spawn(async move {
            for batch in batches {
                if batch_tx.send(batch).await.is_err() {
                    tracing::error!("All sync workers exited before the queue was drained");
                    break;
                }
            }
        });

        let mut totals = SyncTotals::default();
        while let Some(outcome) = outcome_rx.recv().await {
            if let Some(error) = &outcome.error {
                tracing::warn!(
                    batch_id = outcome.batch_id,
                    success = outcome.success_count,
                    failed = outcome.error_count,
                    "Batch upsert reported errors: {}",
                    error
                );
            }
            totals.absorb(&outcome);
        }

        let mut worker_failure = None;
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Sync worker terminated abnormally: {}", e);
                worker_failure.get_or_insert_with(|| e.to_string());
            }
        }
        if let Err(e) = producer.await {
            worker_failure.get_or_insert_with(|| e.to_string());
        }

        if let Some(message) = worker_failure {
            return Err(SyncError::WorkerFailed(message));
        }
        if totals.batches != expected {
            return Err(SyncError::IncompleteRun {
                expected,
                reported: totals.batches,
            });
        }

        tracing::info!(
            success = totals.success,
            failed = totals.errors,
            failed_batches = totals.failed_batches,
            "Batch upsert completed"
        );

        Ok(totals)
    }
}

async fn run_worker(
    worker_id: usize,
    queue: BatchQueue,
    outcomes: mpsc::Sender<BatchOutcome>,
    repository: Arc<dyn SymbolRepository>,
) {
    loop {
        let next = queue.lock().await.recv().await;
        let Some(batch) = next else {
            break;
        };

        tracing::debug!(
            worker_id,
            batch_id = batch.id,
            size = batch.len(),
            "Worker picked up batch"
        );

        let outcome = upsert_batch(&repository, batch).await;

        tracing::debug!(
            worker_id,
            batch_id = outcome.batch_id,
            success = outcome.success_count,
            failed = outcome.error_count,
            "Worker finished batch"
        );

        if outcomes.send(outcome).await.is_err() {
            break;
        }
    }
}

/// Run one blocking upsert call and turn its result into an outcome
///
/// Counts are clamped so `success + error <= batch length` holds even for a
/// store that over-reports.
async fn upsert_batch(repository: &Arc<dyn SymbolRepository>, batch: Batch<NewSymbol>) -> BatchOutcome {
    let batch_id = batch.id;
    let len = batch.len();
    let repository = Arc::clone(repository);

    match tokio::task::spawn_blocking(move || repository.batch_upsert(&batch.records)).await {
        Ok(Ok(summary)) => {
            let success_count = summary.succeeded.min(len);
            let error_count = summary.failed.min(len - success_count);
            BatchOutcome {
                batch_id,
                success_count,
                error_count,
                error: summary.first_error,
            }
        }
        Ok(Err(e)) => BatchOutcome {
            batch_id,
            success_count: 0,
            error_count: len,
            error: Some(e.to_string()),
        },
        Err(e) => BatchOutcome {
            batch_id,
            success_count: 0,
            error_count: len,
            error: Some(format!("upsert task failed: {}", e)),
        },
    }
}
