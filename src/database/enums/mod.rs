pub mod market;
pub mod subscription_item;

pub use market::Market;
pub use subscription_item::SubscriptionItem;
