use std::collections::HashMap;
use std::sync::Arc;

use super::batch::split_into_batches;
use super::worker_pool::{SyncTotals, WorkerPool};
use super::{SyncConfig, SyncError};
use crate::database::enums::Market;
use crate::database::models::NewSymbol;
use crate::database::repositories::SymbolRepository;
use crate::providers::{CatalogEntry, CatalogFetcher};

/// Result of one market sync
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Catalog fetched and upserted
    Completed {
        market: Market,
        fetched: usize,
        totals: SyncTotals,
    },
    /// Provider answered with a non-success envelope; nothing was written
    Skipped {
        market: Market,
        status: i32,
        message: String,
    },
}

/// Reconciles an upstream symbol catalog against the local store
///
/// Each call is self-contained; overlapping runs only repeat idempotent upserts.
pub struct SymbolSyncService {
    fetcher: Arc<dyn CatalogFetcher>,
    repository: Arc<dyn SymbolRepository>,
    config: SyncConfig,
}

impl SymbolSyncService {
    pub fn new(
        fetcher: Arc<dyn CatalogFetcher>,
        repository: Arc<dyn SymbolRepository>,
        config: SyncConfig,
    ) -> Self {
        Self {
            fetcher,
            repository,
            config,
        }
    }

    /// Sync one market's catalog
    ///
    /// Transport/decode failures are returned as errors. A non-success
    /// envelope status is logged and reported as [`SyncOutcome::Skipped`] so
    /// the scheduler keeps running.
    pub async fn sync_market(&self, market: Market) -> Result<SyncOutcome, SyncError> {
        tracing::info!("🔄 Syncing {} symbol catalog", market);

        let envelope = self.fetcher.fetch_catalog(market).await.map_err(|e| {
            tracing::error!("❌ {} catalog fetch failed: {}", market, e);
            SyncError::from(e)
        })?;

        if !envelope.is_success() {
            tracing::error!(
                status = envelope.status,
                message = %envelope.message,
                "❌ {} catalog provider returned an error status, skipping sync",
                market
            );
            return Ok(SyncOutcome::Skipped {
                market,
                status: envelope.status,
                message: envelope.message,
            });
        }

        let fetched = envelope.data.len();
        tracing::info!("Fetched {} {} catalog entries", fetched, market);

        let records: Vec<NewSymbol> = envelope
            .data
            .iter()
            .map(|entry| to_sync_record(entry, market))
            .collect();

        let batches = split_into_batches(&records, self.config.batch_size);
        let pool = WorkerPool::new(Arc::clone(&self.repository), self.config.max_workers);
        let totals = pool.run(batches).await?;

        tracing::info!(
            success = totals.success,
            failed = totals.errors,
            total = fetched,
            "✅ {} symbol sync completed",
            market
        );

        Ok(SyncOutcome::Completed {
            market,
            fetched,
            totals,
        })
    }

    /// Symbol count per market as currently stored
    pub async fn sync_stats(&self) -> Result<HashMap<Market, i64>, SyncError> {
        let repository = Arc::clone(&self.repository);
        let stats = tokio::task::spawn_blocking(move || repository.get_market_stats())
            .await
            .map_err(|e| SyncError::WorkerFailed(format!("stats task failed: {}", e)))??;
        Ok(stats)
    }
}

fn to_sync_record(entry: &CatalogEntry, market: Market) -> NewSymbol {
    NewSymbol::new(entry.stock_id.trim(), entry.stock_name.trim(), market)
}
