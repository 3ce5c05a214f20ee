//! Process startup.
//!
//! [`orchestrator`] runs a two-pass construction list under a deadline;
//! [`components`] describes the plans used by the binaries.

pub mod components;
pub mod orchestrator;

use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;

pub use components::{initialize_scheduler, initialize_sync, SchedulerComponents, SyncComponents};
pub use orchestrator::{initialize_all, DependentUnit, InitPlan, InitUnit};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Startup failures; any of these aborts the process
#[derive(Debug, Error)]
pub enum InitError {
    #[error("Initialization timed out after {deadline:?} (pending: {})", .pending.join(", "))]
    Timeout {
        deadline: Duration,
        pending: Vec<String>,
    },

    #[error("Failed to initialize {unit}: {source}")]
    UnitFailed { unit: String, source: BoxError },

    #[error("Initialization of {unit} panicked: {message}")]
    UnitPanicked { unit: String, message: String },

    #[error("Component {0} was not initialized")]
    MissingSlot(&'static str),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
