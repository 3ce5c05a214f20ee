use std::sync::Arc;

use stock_notify::{initialize_scheduler, AppConfig, NotificationJob, SymbolSyncJob};
use tokio_cron_scheduler::JobScheduler;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file (if present)
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stock_notify=debug".into()),
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

    let components = match initialize_scheduler(&config).await {
        Ok(components) => components,
        Err(e) => {
            tracing::error!("❌ Startup failed: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!("🚀 Components initialized");

    // scheduler_plan already validated the timezone
    let timezone = match config.scheduler.tz() {
        Ok(tz) => tz,
        Err(e) => {
            tracing::error!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let sync_job = SymbolSyncJob::new(Arc::clone(&components.sync_service));
    let notification_job = NotificationJob::new(Arc::clone(&components.notification_service));

    // One pass at startup so a fresh deployment has a catalog and sends today's digest
    sync_job.run_now().await;
    notification_job.run_now().await;

    tracing::info!("⏰ Initializing cron scheduler...");

    let mut scheduler = match JobScheduler::new().await {
        Ok(scheduler) => scheduler,
        Err(e) => {
            tracing::error!("❌ Failed to create cron scheduler: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = sync_job
        .register(&scheduler, &config.scheduler.symbol_sync_spec, timezone)
        .await
    {
        tracing::error!("❌ Failed to register symbol sync job: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = notification_job
        .register(&scheduler, &config.scheduler.stock_spec, timezone)
        .await
    {
        tracing::error!("❌ Failed to register notification job: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = scheduler.start().await {
        tracing::error!("❌ Failed to start cron scheduler: {}", e);
        std::process::exit(1);
    }

    tracing::info!("✅ Cron scheduler started successfully");
    tracing::info!("   • Symbol sync: {}", config.scheduler.symbol_sync_spec);
    tracing::info!("   • Notifications: {}", config.scheduler.stock_spec);

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("❌ Failed to listen for shutdown signal: {}", e);
    }

    tracing::info!("🛑 Shutting down");
    if let Err(e) = scheduler.shutdown().await {
        tracing::error!("❌ Scheduler shutdown failed: {}", e);
    }

    // The pool closes its connections when the last handle drops
    drop(components.database);
}
