use std::sync::Arc;

use chrono_tz::Tz;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::notify::{FeatureRun, NotificationRun, NotificationService};

/// Scheduled notification cycle: every feature fans out once per trigger
pub struct NotificationJob {
    service: Arc<NotificationService>,
}

impl NotificationJob {
    pub fn new(service: Arc<NotificationService>) -> Self {
        Self { service }
    }

    async fn run_cycle(service: &NotificationService) -> NotificationRun {
        let start = std::time::Instant::now();
        tracing::debug!("🕐 Notification job triggered");

        let run = service.run_all().await;

        log_report("stock price", &run.stock_price);
        log_report("stock news", &run.stock_news);
        log_report("daily market info", &run.daily_market_info);
        log_report("top volume items", &run.top_volume_items);
        tracing::info!("Notification cycle finished in {:?}", start.elapsed());

        run
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
                Self::run_cycle(&service).await;
            })
        })?;

        scheduler.add(job).await?;

        tracing::info!("✅ Notification job registered");
        tracing::info!("   Schedule: {} ({})", spec, timezone);

        Ok(())
    }

    /// Run one notification cycle immediately (manual trigger)
    pub async fn run_now(&self) -> NotificationRun {
        Self::run_cycle(&self.service).await
    }
}

fn log_report(feature: &str, run: &FeatureRun) {
    match run {
        FeatureRun::NothingToSend => tracing::debug!("   {}: nothing to send", feature),
        FeatureRun::LoadFailed(reason) => {
            tracing::error!("❌ {}: subscriptions could not be loaded: {}", feature, reason)
        }
        FeatureRun::Dispatched(r) if r.topics_failed > 0 || r.send_failures > 0 => tracing::warn!(
            "⚠️  {}: {}/{} delivered across {} topics ({} topics failed, {} sends failed, {} unresolved)",
            feature,
            r.delivered,
            r.attempted,
            r.topics,
            r.topics_failed,
            r.send_failures,
            r.unresolved
        ),
        FeatureRun::Dispatched(r) => tracing::info!(
            "📨 {}: {}/{} delivered across {} topics",
            feature,
            r.delivered,
            r.attempted,
            r.topics
        ),
    }
}
