use std::sync::Arc;

use super::{TopicGroups, TopicKey};
use crate::database::enums::SubscriptionItem;
use crate::database::models::SubscriptionSymbol;
use crate::database::repositories::{SubscriptionRepository, SubscriptionSymbolRepository};
use crate::database::DatabaseError;

/// Builds per-cycle topic groups from the subscription tables
pub struct SubscriptionGrouper {
    subscription_symbols: Arc<dyn SubscriptionSymbolRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl SubscriptionGrouper {
    pub fn new(
        subscription_symbols: Arc<dyn SubscriptionSymbolRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
    ) -> Self {
        Self {
            subscription_symbols,
            subscriptions,
        }
    }

    /// Group symbol subscribers by symbol code
    ///
    /// With a `filter`, only join rows whose subscription is for that feature
    /// are kept. Returns `Ok(None)` when nothing is left to notify.
    pub fn group_by_topic(
        &self,
        filter: Option<SubscriptionItem>,
    ) -> Result<Option<TopicGroups>, DatabaseError> {
        let rows = self.subscription_symbols.get_all()?;
        let groups = group_join_rows(&rows, filter);

        if groups.is_empty() {
            tracing::info!("No symbol subscriptions to notify");
            return Ok(None);
        }

        tracing::debug!(
            topics = groups.len(),
            rows = rows.len(),
            "Grouped symbol subscriptions"
        );
        Ok(Some(groups))
    }

    /// Single broadcast topic holding every active subscriber of `item`
    pub fn group_by_feature(
        &self,
        item: SubscriptionItem,
    ) -> Result<Option<TopicGroups>, DatabaseError> {
        let subscriptions = self.subscriptions.get_by_feature(item)?;
        if subscriptions.is_empty() {
            tracing::info!("No subscribers for {}", item);
            return Ok(None);
        }

        let mut groups = TopicGroups::new();
        groups
            .entry(TopicKey::Feature(item))
            .or_default()
            .extend(subscriptions.iter().map(|s| s.user_id));

        Ok(Some(groups))
    }
}

/// Fold join rows into topic groups
///
/// Rows with an unresolved symbol or subscription are skipped with a warning.
/// Inactive subscriptions are skipped silently.
pub fn group_join_rows(rows: &[SubscriptionSymbol], filter: Option<SubscriptionItem>) -> TopicGroups {
    let mut groups = TopicGroups::new();

    for row in rows {
        let (Some(symbol), Some(subscription)) = (&row.symbol, &row.subscription) else {
            tracing::warn!(
                subscription_id = row.subscription_id,
                "⚠️ Skipping subscription row with unresolved symbol or subscription"
            );
            continue;
        };

        if !subscription.status {
            continue;
        }
        if filter.is_some_and(|item| item != subscription.item) {
            continue;
        }

        groups
            .entry(TopicKey::Symbol(symbol.symbol.clone()))
            .or_default()
            .insert(subscription.user_id);
    }

    groups
}
