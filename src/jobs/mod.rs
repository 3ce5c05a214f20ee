/// Scheduled jobs
///
/// - Catalog synchronization from FinMind into the symbol store
/// - Notification fan-out to subscribers

pub mod notification_job;
pub mod symbol_sync_job;

pub use notification_job::NotificationJob;
pub use symbol_sync_job::SymbolSyncJob;
