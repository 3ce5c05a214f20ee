use std::sync::Arc;
use std::time::Duration;

use chrono_tz::Tz;

use super::orchestrator::{initialize_all, DependentUnit, InitPlan, InitUnit};
use super::InitError;
use crate::config::AppConfig;
use crate::database::repositories::{
    SubscriptionRepository, SubscriptionRepositoryImpl, SubscriptionSymbolRepository,
    SubscriptionSymbolRepositoryImpl, SymbolRepository, SymbolRepositoryImpl, UserRepository,
    UserRepositoryImpl,
};
use crate::database::{establish_connection_pool, DatabaseError, DatabasePool, MemorySymbolRepository};
use crate::notify::{
    NotificationDispatcher, NotificationService, PayloadBuilder, SubscriptionGrouper, TelegramSender,
};
use crate::providers::FinMindClient;
use crate::sync::SymbolSyncService;

/// Slot arena filled during startup
///
/// The concurrent phase fills the connection and client slots; dependent
/// units read them to build repositories and services.
#[derive(Default)]
pub struct ComponentSlots {
    database: Option<DatabasePool>,
    finmind: Option<Arc<FinMindClient>>,
    telegram: Option<Arc<TelegramSender>>,
    symbols: Option<Arc<dyn SymbolRepository>>,
    users: Option<Arc<dyn UserRepository>>,
    subscriptions: Option<Arc<dyn SubscriptionRepository>>,
    subscription_symbols: Option<Arc<dyn SubscriptionSymbolRepository>>,
    sync_service: Option<Arc<SymbolSyncService>>,
    notification_service: Option<Arc<NotificationService>>,
    dry_run: bool,
}

fn required<'a, T>(slot: &'a Option<T>, name: &'static str) -> Result<&'a T, InitError> {
    slot.as_ref().ok_or(InitError::MissingSlot(name))
}

/// Everything the scheduler binary runs on
pub struct SchedulerComponents {
    pub database: DatabasePool,
    pub sync_service: Arc<SymbolSyncService>,
    pub notification_service: Arc<NotificationService>,
}

/// Everything the catalog sync binary runs on
pub struct SyncComponents {
    pub sync_service: Arc<SymbolSyncService>,
    /// Set when no database is configured and records go to memory
    pub dry_run: bool,
}

/// Connect, migrate, and return the pool (blocking work on the blocking pool)
async fn connect_database(url: String, pool_size: u32) -> Result<DatabasePool, DatabaseError> {
    tokio::task::spawn_blocking(move || {
        let pool = establish_connection_pool(&url, pool_size)?;
        let applied = pool.run_migrations()?;
        tracing::info!("🗄️  Database ready ({} migrations applied)", applied);
        Ok(pool)
    })
    .await
    .map_err(|e| DatabaseError::ConnectionFailed(format!("connect task failed: {}", e)))?
}

fn finmind_unit(config: &AppConfig) -> InitUnit<ComponentSlots> {
    let url = config.finmind.api_url.clone();
    let token = config.finmind.token.clone();
    let timeout = Duration::from_secs(config.finmind.timeout_secs);

    InitUnit::new(
        "finmind",
        async move { FinMindClient::new(url, token, timeout) },
        |slots: &mut ComponentSlots, client| slots.finmind = Some(Arc::new(client)),
    )
}

fn symbol_sync_unit(config: &AppConfig) -> DependentUnit<ComponentSlots> {
    let sync_config = config.sync.clone();

    DependentUnit::new("symbol_sync", move |slots: &mut ComponentSlots| -> Result<(), InitError> {
        let fetcher = Arc::clone(required(&slots.finmind, "finmind")?);
        let symbols = Arc::clone(required(&slots.symbols, "symbols")?);
        slots.sync_service = Some(Arc::new(SymbolSyncService::new(fetcher, symbols, sync_config)));
        Ok(())
    })
}

fn notifications_unit(timezone: Tz, max_concurrent_topics: usize) -> DependentUnit<ComponentSlots> {
    DependentUnit::new("notifications", move |slots: &mut ComponentSlots| -> Result<(), InitError> {
        let telegram = Arc::clone(required(&slots.telegram, "telegram")?);
        let finmind = Arc::clone(required(&slots.finmind, "finmind")?);

        let grouper = SubscriptionGrouper::new(
            Arc::clone(required(&slots.subscription_symbols, "subscription_symbols")?),
            Arc::clone(required(&slots.subscriptions, "subscriptions")?),
        );
        let dispatcher = NotificationDispatcher::new(
            Arc::clone(required(&slots.users, "users")?),
            telegram,
            max_concurrent_topics,
        );
        let payloads = PayloadBuilder::new(finmind, Arc::clone(required(&slots.symbols, "symbols")?));

        slots.notification_service = Some(Arc::new(NotificationService::new(
            grouper, dispatcher, payloads, timezone,
        )));
        Ok(())
    })
}

/// Scheduler startup: database, FinMind and Telegram concurrently, then
/// repositories and services in order
pub fn scheduler_plan(config: &AppConfig) -> Result<InitPlan<ComponentSlots>, InitError> {
    let database_url = config.require_database_url()?.to_string();
    let bot_token = config.require_bot_token()?.to_string();
    let timezone = config.scheduler.tz()?;
    let pool_size = config.db_pool_max_size;
    let telegram_url = config.telegram.api_url.clone();
    let telegram_timeout = Duration::from_secs(config.telegram.timeout_secs);
    let max_concurrent_topics = config.dispatch_max_concurrent_topics;

    let plan = InitPlan::new()
        .unit(InitUnit::new(
            "database",
            connect_database(database_url, pool_size),
            |slots: &mut ComponentSlots, pool| slots.database = Some(pool),
        ))
        .unit(finmind_unit(config))
        .unit(InitUnit::new(
            "telegram",
            async move { TelegramSender::new(&telegram_url, &bot_token, telegram_timeout) },
            |slots: &mut ComponentSlots, sender| slots.telegram = Some(Arc::new(sender)),
        ))
        .then(DependentUnit::new("repositories", |slots: &mut ComponentSlots| -> Result<(), InitError> {
            let database = required(&slots.database, "database")?;

            let pool = database.clone();
            slots.symbols = Some(Arc::new(SymbolRepositoryImpl::new(move || pool.get_conn())));
            let pool = database.clone();
            slots.users = Some(Arc::new(UserRepositoryImpl::new(move || pool.get_conn())));
            let pool = database.clone();
            slots.subscriptions = Some(Arc::new(SubscriptionRepositoryImpl::new(move || pool.get_conn())));
            let pool = database.clone();
            slots.subscription_symbols =
                Some(Arc::new(SubscriptionSymbolRepositoryImpl::new(move || pool.get_conn())));

            Ok(())
        }))
        .then(symbol_sync_unit(config))
        .then(notifications_unit(timezone, max_concurrent_topics));

    Ok(plan)
}

/// Catalog sync startup; without a database the catalog is kept in memory
pub fn sync_plan(config: &AppConfig) -> InitPlan<ComponentSlots> {
    let store = match config.database_url.clone() {
        Some(url) => {
            let pool_size = config.db_pool_max_size;
            InitUnit::new(
                "catalog_store",
                connect_database(url, pool_size),
                |slots: &mut ComponentSlots, pool: DatabasePool| {
                    let repo_pool = pool.clone();
                    slots.symbols = Some(Arc::new(SymbolRepositoryImpl::new(move || repo_pool.get_conn())));
                    slots.database = Some(pool);
                },
            )
        }
        None => InitUnit::new(
            "catalog_store",
            async { Ok::<_, InitError>(MemorySymbolRepository::new()) },
            |slots: &mut ComponentSlots, memory| {
                slots.symbols = Some(Arc::new(memory));
                slots.dry_run = true;
            },
        ),
    };

    InitPlan::new()
        .unit(store)
        .unit(finmind_unit(config))
        .then(symbol_sync_unit(config))
}

pub async fn initialize_scheduler(config: &AppConfig) -> Result<SchedulerComponents, InitError> {
    let plan = scheduler_plan(config)?;
    let mut slots = initialize_all(plan, Duration::from_secs(config.init_timeout_secs)).await?;

    Ok(SchedulerComponents {
        database: slots.database.take().ok_or(InitError::MissingSlot("database"))?,
        sync_service: slots.sync_service.take().ok_or(InitError::MissingSlot("symbol_sync"))?,
        notification_service: slots
            .notification_service
            .take()
            .ok_or(InitError::MissingSlot("notifications"))?,
    })
}

pub async fn initialize_sync(config: &AppConfig) -> Result<SyncComponents, InitError> {
    let mut slots = initialize_all(sync_plan(config), Duration::from_secs(config.init_timeout_secs)).await?;

    Ok(SyncComponents {
        sync_service: slots.sync_service.take().ok_or(InitError::MissingSlot("symbol_sync"))?,
        dry_run: slots.dry_run,
    })
}
