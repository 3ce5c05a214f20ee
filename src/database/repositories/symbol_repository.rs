use crate::database::connection::{DatabaseError, PgPooledConnection};
use crate::database::enums::Market;
use crate::database::models::{NewSymbol, Symbol};
use crate::database::schema::symbols;
use chrono::Utc;
use diesel::dsl::count_star;
use diesel::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

/// Per-record split reported by a batch upsert
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpsertSummary {
    pub succeeded: usize,
    pub failed: usize,
    /// First per-record failure, if any record failed
    pub first_error: Option<String>,
}

impl UpsertSummary {
    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self, error: impl ToString) {
        self.failed += 1;
        if self.first_error.is_none() {
            self.first_error = Some(error.to_string());
        }
    }
}

/// Symbol catalog repository
///
/// Implementations must be safe to call from several sync workers at once.
pub trait SymbolRepository: Send + Sync {
    /// Upsert every record keyed by `(symbol, market)`
    ///
    /// Individual record failures are counted in the summary; `Err` means the
    /// whole batch could not be attempted (e.g. no connection).
    fn batch_upsert(&self, new_symbols: &[NewSymbol]) -> Result<UpsertSummary, DatabaseError>;

    /// Symbol count per market
    fn get_market_stats(&self) -> Result<HashMap<Market, i64>, DatabaseError>;

    /// Find symbol by code within a market
    fn find_by_code(&self, symbol: &str, market: Market) -> Result<Option<Symbol>, DatabaseError>;
}

/// Diesel-backed SymbolRepository
pub struct SymbolRepositoryImpl {
    get_conn: Arc<dyn Fn() -> Result<PgPooledConnection, DatabaseError> + Send + Sync>,
}

impl SymbolRepositoryImpl {
    /// Create new symbol repository with connection provider
    pub fn new<F>(get_conn: F) -> Self
    where
        F: Fn() -> Result<PgPooledConnection, DatabaseError> + Send + Sync + 'static,
    {
        Self {
            get_conn: Arc::new(get_conn),
        }
    }
}

impl SymbolRepository for SymbolRepositoryImpl {
    fn batch_upsert(&self, new_symbols: &[NewSymbol]) -> Result<UpsertSummary, DatabaseError> {
        let mut conn = (self.get_conn)()?;
        let mut summary = UpsertSummary::default();

        // Row by row without a wrapping transaction so one bad record
        // does not roll back the rest of the batch.
        for new_symbol in new_symbols {
            let result = diesel::insert_into(symbols::table)
                .values(new_symbol)
                .on_conflict((symbols::symbol, symbols::market))
                .do_update()
                .set((
                    symbols::name.eq(&new_symbol.name),
                    symbols::updated_at.eq(Utc::now()),
                ))
                .execute(&mut conn);

            match result {
                Ok(_) => summary.record_success(),
                Err(e) => {
                    tracing::debug!(
                        symbol = %new_symbol.symbol,
                        market = %new_symbol.market,
                        "Symbol upsert failed: {}",
                        e
                    );
                    summary.record_failure(e);
                }
            }
        }

        Ok(summary)
    }

    fn get_market_stats(&self) -> Result<HashMap<Market, i64>, DatabaseError> {
        let mut conn = (self.get_conn)()?;

        let rows = symbols::table
            .group_by(symbols::market)
            .select((symbols::market, count_star()))
            .load::<(Market, i64)>(&mut conn)?;

        Ok(rows.into_iter().collect())
    }

    fn find_by_code(&self, symbol: &str, market: Market) -> Result<Option<Symbol>, DatabaseError> {
        let mut conn = (self.get_conn)()?;

        symbols::table
            .filter(symbols::symbol.eq(symbol))
            .filter(symbols::market.eq(market))
            .first::<Symbol>(&mut conn)
            .optional()
            .map_err(DatabaseError::from)
    }
}
