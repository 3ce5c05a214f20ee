use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::Pg;
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::Integer;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Notification feature a user can subscribe to
///
/// Stored as its numeric feature ID. Symbol-scoped features (`StockPrice`,
/// `StockNews`) are additionally linked to symbols through `subscription_symbols`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = Integer)]
pub enum SubscriptionItem {
    StockPrice,
    StockNews,
    DailyMarketInfo,
    TopVolumeItems,
}

impl SubscriptionItem {
    pub fn id(&self) -> i32 {
        match self {
            SubscriptionItem::StockPrice => 1,
            SubscriptionItem::StockNews => 2,
            SubscriptionItem::DailyMarketInfo => 3,
            SubscriptionItem::TopVolumeItems => 4,
        }
    }

    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            1 => Some(SubscriptionItem::StockPrice),
            2 => Some(SubscriptionItem::StockNews),
            3 => Some(SubscriptionItem::DailyMarketInfo),
            4 => Some(SubscriptionItem::TopVolumeItems),
            _ => None,
        }
    }

    /// Whether the feature fans out per symbol rather than as one broadcast
    pub fn is_symbol_scoped(&self) -> bool {
        matches!(self, SubscriptionItem::StockPrice | SubscriptionItem::StockNews)
    }
}

impl fmt::Display for SubscriptionItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubscriptionItem::StockPrice => "stock_price",
            SubscriptionItem::StockNews => "stock_news",
            SubscriptionItem::DailyMarketInfo => "daily_market_info",
            SubscriptionItem::TopVolumeItems => "top_volume_items",
        };
        write!(f, "{}", name)
    }
}

impl ToSql<Integer, Pg> for SubscriptionItem {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        let id = self.id();
        <i32 as ToSql<Integer, Pg>>::to_sql(&id, &mut out.reborrow())
    }
}

impl FromSql<Integer, Pg> for SubscriptionItem {
    fn from_sql(bytes: <Pg as diesel::backend::Backend>::RawValue<'_>) -> deserialize::Result<Self> {
        let id = <i32 as FromSql<Integer, Pg>>::from_sql(bytes)?;
        SubscriptionItem::from_id(id).ok_or_else(|| format!("Invalid subscription item: {}", id).into())
    }
}
