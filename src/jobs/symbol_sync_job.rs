use std::sync::Arc;

use chrono_tz::Tz;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::database::enums::Market;
use crate::sync::{SymbolSyncService, SyncError, SyncOutcome};

/// Catalog synchronization job
///
/// Syncs every market in turn, then logs the per-market symbol counts.
pub struct SymbolSyncJob {
    service: Arc<SymbolSyncService>,
}

impl SymbolSyncJob {
    pub fn new(service: Arc<SymbolSyncService>) -> Self {
        Self { service }
    }

    async fn sync_all(service: &SymbolSyncService) -> Vec<Result<SyncOutcome, SyncError>> {
        tracing::info!("Starting symbol synchronization job");

        let mut outcomes = Vec::with_capacity(Market::all().len());
        for market in Market::all() {
            let outcome = service.sync_market(market).await;
            match &outcome {
                Ok(SyncOutcome::Completed { fetched, totals, .. }) => tracing::info!(
                    "✅ {} sync completed: {} fetched, {} stored, {} errors",
                    market,
                    fetched,
                    totals.success,
                    totals.errors
                ),
                Ok(SyncOutcome::Skipped { status, message, .. }) => {
                    tracing::warn!("⚠️  {} sync skipped (status {}): {}", market, status, message)
                }
                Err(e) => tracing::error!("❌ {} sync failed: {}", market, e),
            }
            outcomes.push(outcome);
        }

        match service.sync_stats().await {
            Ok(stats) => {
                for market in Market::all() {
                    tracing::info!("📊 {}: {} symbols", market, stats.get(&market).copied().unwrap_or(0));
                }
            }
            Err(e) => tracing::error!("❌ {}", e),
        }

        outcomes
    }

    /// Register this job with the scheduler
    pub async fn register(
        self,
        scheduler: &JobScheduler,
        spec: &str,
        timezone: Tz,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let service = self.service;

        let job = Job::new_async_tz(spec, timezone, move |_uuid, _lock| {
            let service = Arc::clone(&service);

            Box::pin(async move {
                let failed = Self::sync_all(&service)
                    .await
                    .iter()
                    .filter(|outcome| outcome.is_err())
                    .count();
                if failed > 0 {
                    tracing::error!("Symbol sync job finished with {} failed markets", failed);
                } else {
                    tracing::debug!("Symbol sync job completed successfully");
                }
            })
        })?;

        scheduler.add(job).await?;

        tracing::info!("Symbol sync job registered ({} {})", spec, timezone);

        Ok(())
    }

    /// Run the sync immediately (manual trigger); one result per market
    pub async fn run_now(&self) -> Vec<Result<SyncOutcome, SyncError>> {
        Self::sync_all(&self.service).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::repositories::SymbolRepository;
    use crate::database::MemorySymbolRepository;
    use crate::sync::SyncConfig;
    use crate::test_support::{catalog_entries, StubCatalogFetcher};

    fn job(fetcher: Arc<StubCatalogFetcher>, repo: Arc<MemorySymbolRepository>) -> SymbolSyncJob {
        SymbolSyncJob::new(Arc::new(SymbolSyncService::new(fetcher, repo, SyncConfig::default())))
    }

    #[tokio::test]
    async fn test_run_now_syncs_every_market() {
        let fetcher = Arc::new(StubCatalogFetcher::ok(catalog_entries(30)));
        let repo = Arc::new(MemorySymbolRepository::new());

        let outcomes = job(fetcher.clone(), repo.clone()).run_now().await;

        assert_eq!(outcomes.len(), Market::all().len());
        assert!(outcomes
            .iter()
            .all(|o| matches!(o, Ok(SyncOutcome::Completed { fetched: 30, .. }))));
        assert_eq!(fetcher.calls(), Market::all().len());

        let stats = repo.get_market_stats().unwrap();
        assert_eq!(stats.get(&Market::Taiwan), Some(&30));
        assert_eq!(stats.get(&Market::UnitedStates), Some(&30));
    }

    #[tokio::test]
    async fn test_run_now_keeps_going_after_a_failure() {
        let fetcher = Arc::new(StubCatalogFetcher::unreachable());
        let repo = Arc::new(MemorySymbolRepository::new());

        let outcomes = job(fetcher.clone(), repo).run_now().await;

        assert!(outcomes.iter().all(|o| o.is_err()));
        assert_eq!(fetcher.calls(), Market::all().len());
    }

    #[tokio::test]
    async fn test_register_accepts_schedule() {
        let scheduler = JobScheduler::new().await.unwrap();
        let fetcher = Arc::new(StubCatalogFetcher::ok(Vec::new()));
        let repo = Arc::new(MemorySymbolRepository::new());

        job(fetcher, repo)
            .register(&scheduler, "0 0 3 * * *", chrono_tz::Asia::Taipei)
            .await
            .unwrap();
    }
}
