//! Catalog sync runner.
//!
//! Runs one sync of every market at startup. With `DATABASE_URL` set it then
//! stays up and re-syncs on `SYMBOL_SYNC_SPEC`; without it the catalog goes to
//! an in-memory store, the counts are printed and the process exits.

use std::sync::Arc;

use stock_notify::{initialize_sync, AppConfig, SymbolSyncJob};
use tokio_cron_scheduler::JobScheduler;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stock_notify=info,sync_symbols=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let components = match initialize_sync(&config).await {
        Ok(components) => components,
        Err(e) => {
            tracing::error!("❌ Startup failed: {}", e);
            std::process::exit(1);
        }
    };

    let job = SymbolSyncJob::new(Arc::clone(&components.sync_service));
    let outcomes = job.run_now().await;

    if components.dry_run {
        tracing::info!("🧪 Dry run (no DATABASE_URL): nothing was persisted");
        let failed = outcomes.iter().filter(|outcome| outcome.is_err()).count();
        std::process::exit(if failed > 0 { 1 } else { 0 });
    }

    let timezone = match config.scheduler.tz() {
        Ok(tz) => tz,
        Err(e) => {
            tracing::error!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let mut scheduler = match JobScheduler::new().await {
        Ok(scheduler) => scheduler,
        Err(e) => {
            tracing::error!("❌ Failed to create cron scheduler: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = job
        .register(&scheduler, &config.scheduler.symbol_sync_spec, timezone)
        .await
    {
        tracing::error!("❌ Failed to register symbol sync job: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = scheduler.start().await {
        tracing::error!("❌ Failed to start cron scheduler: {}", e);
        std::process::exit(1);
    }

    tracing::info!("✅ Symbol sync scheduled: {}", config.scheduler.symbol_sync_spec);

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("❌ Failed to listen for shutdown signal: {}", e);
    }

    tracing::info!("🛑 Shutting down");
    if let Err(e) = scheduler.shutdown().await {
        tracing::error!("❌ Scheduler shutdown failed: {}", e);
    }
}
