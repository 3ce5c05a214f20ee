use crate::database::connection::{DatabaseError, PgPooledConnection};
use crate::database::enums::SubscriptionItem;
use crate::database::models::{Subscription, SubscriptionSymbol, SubscriptionSymbolRow, Symbol};
use crate::database::schema::{subscription_symbols, subscriptions, symbols};
use diesel::prelude::*;
use std::sync::Arc;

/// Feature subscriptions (broadcast topics)
pub trait SubscriptionRepository: Send + Sync {
    /// Active subscriptions to one feature
    fn get_by_feature(&self, item: SubscriptionItem) -> Result<Vec<Subscription>, DatabaseError>;
}

/// Subscription-to-symbol join records (per-symbol topics)
pub trait SubscriptionSymbolRepository: Send + Sync {
    /// Every join row, ordered by subscription, with its symbol and
    /// subscription back-references resolved through outer joins
    fn get_all(&self) -> Result<Vec<SubscriptionSymbol>, DatabaseError>;
}

pub struct SubscriptionRepositoryImpl {
    get_conn: Arc<dyn Fn() -> Result<PgPooledConnection, DatabaseError> + Send + Sync>,
}

impl SubscriptionRepositoryImpl {
    pub fn new<F>(get_conn: F) -> Self
    where
        F: Fn() -> Result<PgPooledConnection, DatabaseError> + Send + Sync + 'static,
    {
        Self {
            get_conn: Arc::new(get_conn),
        }
    }
}

impl SubscriptionRepository for SubscriptionRepositoryImpl {
    fn get_by_feature(&self, item: SubscriptionItem) -> Result<Vec<Subscription>, DatabaseError> {
        let mut conn = (self.get_conn)()?;

        subscriptions::table
            .filter(subscriptions::item.eq(item))
            .filter(subscriptions::status.eq(true))
            .order(subscriptions::user_id.asc())
            .load::<Subscription>(&mut conn)
            .map_err(DatabaseError::from)
    }
}

pub struct SubscriptionSymbolRepositoryImpl {
    get_conn: Arc<dyn Fn() -> Result<PgPooledConnection, DatabaseError> + Send + Sync>,
}

impl SubscriptionSymbolRepositoryImpl {
    pub fn new<F>(get_conn: F) -> Self
    where
        F: Fn() -> Result<PgPooledConnection, DatabaseError> + Send + Sync + 'static,
    {
        Self {
            get_conn: Arc::new(get_conn),
        }
    }
}

type JoinedRow = (SubscriptionSymbolRow, Option<Symbol>, Option<Subscription>);

impl SubscriptionSymbolRepository for SubscriptionSymbolRepositoryImpl {
    fn get_all(&self) -> Result<Vec<SubscriptionSymbol>, DatabaseError> {
        let mut conn = (self.get_conn)()?;

        let rows = subscription_symbols::table
            .left_join(symbols::table)
            .left_join(subscriptions::table)
            .select((
                SubscriptionSymbolRow::as_select(),
                Option::<Symbol>::as_select(),
                Option::<Subscription>::as_select(),
            ))
            .order(subscription_symbols::subscription_id.asc())
            .load::<JoinedRow>(&mut conn)?;

        Ok(rows
            .into_iter()
            .map(|(row, symbol, subscription)| SubscriptionSymbol::from_parts(row, symbol, subscription))
            .collect())
    }
}
