use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;

use super::connection::DatabaseError;
use super::enums::Market;
use super::models::{NewSymbol, Symbol};
use super::repositories::{SymbolRepository, UpsertSummary};

/// In-process symbol catalog
///
/// Used for dry-run syncs when no database is configured. Keyed by
/// `(symbol, market)` exactly like the `symbols` table.
#[derive(Clone, Default)]
pub struct MemorySymbolRepository {
    rows: Arc<RwLock<HashMap<(String, Market), Symbol>>>,
}

impl MemorySymbolRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    /// Snapshot of the catalog sorted by key, for comparisons
    pub fn snapshot(&self) -> Vec<(String, Market, String)> {
        let mut rows: Vec<_> = self
            .rows
            .read()
            .values()
            .map(|s| (s.symbol.clone(), s.market, s.name.clone()))
            .collect();
        rows.sort_by(|a, b| (a.0.as_str(), a.1.as_str()).cmp(&(b.0.as_str(), b.1.as_str())));
        rows
    }
}

impl SymbolRepository for MemorySymbolRepository {
    fn batch_upsert(&self, new_symbols: &[NewSymbol]) -> Result<UpsertSummary, DatabaseError> {
        let mut rows = self.rows.write();
        let mut summary = UpsertSummary::default();
        let now = Utc::now();

        for new_symbol in new_symbols {
            let next_id = rows.len() as i64 + 1;
            rows.entry((new_symbol.symbol.clone(), new_symbol.market))
                .and_modify(|existing| {
                    existing.name = new_symbol.name.clone();
                    existing.updated_at = now;
                })
                .or_insert_with(|| Symbol {
                    id: next_id,
                    symbol: new_symbol.symbol.clone(),
                    name: new_symbol.name.clone(),
                    market: new_symbol.market,
                    created_at: now,
                    updated_at: now,
                });
            summary.record_success();
        }

        Ok(summary)
    }

    fn get_market_stats(&self) -> Result<HashMap<Market, i64>, DatabaseError> {
        let mut stats = HashMap::new();
        for (_, market) in self.rows.read().keys() {
            *stats.entry(*market).or_insert(0) += 1;
        }
        Ok(stats)
    }

    fn find_by_code(&self, symbol: &str, market: Market) -> Result<Option<Symbol>, DatabaseError> {
        Ok(self.rows.read().get(&(symbol.to_string(), market)).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_updates_in_place() {
        let repo = MemorySymbolRepository::new();

        repo.batch_upsert(&[NewSymbol::new("2330", "TSMC", Market::Taiwan)])
            .unwrap();
        repo.batch_upsert(&[NewSymbol::new("2330", "台積電", Market::Taiwan)])
            .unwrap();

        assert_eq!(repo.len(), 1);
        let found = repo.find_by_code("2330", Market::Taiwan).unwrap().unwrap();
        assert_eq!(found.name, "台積電");
    }

    #[test]
    fn test_market_stats() {
        let repo = MemorySymbolRepository::new();
        repo.batch_upsert(&[
            NewSymbol::new("2330", "台積電", Market::Taiwan),
            NewSymbol::new("2317", "鴻海", Market::Taiwan),
            NewSymbol::new("AAPL", "Apple", Market::UnitedStates),
        ])
        .unwrap();

        let stats = repo.get_market_stats().unwrap();
        assert_eq!(stats.get(&Market::Taiwan), Some(&2));
        assert_eq!(stats.get(&Market::UnitedStates), Some(&1));
    }
}
