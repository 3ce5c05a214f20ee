pub mod subscription;
pub mod symbol;
pub mod user;

pub use subscription::{Subscription, SubscriptionSymbol, SubscriptionSymbolRow};
pub use symbol::{NewSymbol, Symbol};
pub use user::User;
