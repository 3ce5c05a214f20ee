/// Repository contracts consumed by the sync engine and the notifier
///
/// Each trait is narrow and synchronous (diesel); async callers that need
/// parallelism move calls onto the blocking pool themselves.

pub mod subscription_repository;
pub mod symbol_repository;
pub mod user_repository;

pub use subscription_repository::{
    SubscriptionRepository, SubscriptionRepositoryImpl, SubscriptionSymbolRepository,
    SubscriptionSymbolRepositoryImpl,
};
pub use symbol_repository::{SymbolRepository, SymbolRepositoryImpl, UpsertSummary};
pub use user_repository::{UserRepository, UserRepositoryImpl};
