use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::Symbol;
use crate::database::enums::SubscriptionItem;

/// A user's subscription to one notification feature
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = crate::database::schema::subscriptions)]
pub struct Subscription {
    pub id: i64,
    pub user_id: i64,
    pub item: SubscriptionItem,
    pub status: bool,
    pub created_at: DateTime<Utc>,
}

/// Raw `subscription_symbols` row
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = crate::database::schema::subscription_symbols)]
pub struct SubscriptionSymbolRow {
    pub id: i64,
    pub subscription_id: i64,
    pub symbol_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Join record linking a subscription to a symbol
///
/// Both back-references come from outer joins and may be unresolved when the
/// referenced row no longer exists.
#[derive(Debug, Clone)]
pub struct SubscriptionSymbol {
    pub subscription_id: i64,
    pub symbol: Option<Symbol>,
    pub subscription: Option<Subscription>,
}

impl SubscriptionSymbol {
    pub fn from_parts(
        row: SubscriptionSymbolRow,
        symbol: Option<Symbol>,
        subscription: Option<Subscription>,
    ) -> Self {
        Self {
            subscription_id: row.subscription_id,
            symbol,
            subscription,
        }
    }
}
