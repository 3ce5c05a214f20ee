use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::database::enums::Market;

/// Symbol entity - one listing in the normalized catalog
///
/// Unique by `(symbol, market)`
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = crate::database::schema::symbols)]
pub struct Symbol {
    pub id: i64,

    /// Exchange code (e.g., "2330", "AAPL")
    pub symbol: String,

    /// Display name as reported upstream
    pub name: String,

    pub market: Market,

    pub created_at: DateTime<Utc>,

    /// Timestamp of the last sync that touched this row
    pub updated_at: DateTime<Utc>,
}

/// Catalog record produced by the sync job
///
/// Immutable once created; written as-is by the batch upsert.
#[derive(Debug, Clone, PartialEq, Eq, Insertable, AsChangeset, Serialize, Deserialize)]
#[diesel(table_name = crate::database::schema::symbols)]
pub struct NewSymbol {
    pub symbol: String,
    pub name: String,
    pub market: Market,
}

impl NewSymbol {
    pub fn new(symbol: impl Into<String>, name: impl Into<String>, market: Market) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            market,
        }
    }

    /// Unique catalog key
    pub fn key(&self) -> (&str, Market) {
        (&self.symbol, self.market)
    }
}
