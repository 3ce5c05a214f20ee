// Library Crate Root
// lib.rs

// Both binaries (the scheduler in main.rs and bin/sync_symbols.rs) import
// through lib.rs like an external crate
pub mod bootstrap;
pub mod config;
pub mod database;
pub mod jobs;
pub mod notify;
pub mod providers;
pub mod sync;

#[cfg(test)]
pub(crate) mod test_support;

// pub use = re-export at crate root
pub use bootstrap::{initialize_scheduler, initialize_sync, InitError};
pub use config::{AppConfig, ConfigError};
pub use jobs::{NotificationJob, SymbolSyncJob};
pub use notify::{NotificationService, TopicKey};
pub use sync::{SymbolSyncService, SyncConfig, SyncOutcome};
