//! Upstream market data providers.
//!
//! The core only talks to the traits in this module: [`CatalogFetcher`] feeds
//! the symbol sync engine and [`QuoteSource`] feeds notification payloads.
//! Transport and decoding live entirely inside the concrete clients.

pub mod finmind;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::database::enums::Market;

pub use finmind::FinMindClient;

/// Status code carried by a successful envelope
pub const STATUS_OK: i32 = 200;

/// Upstream response wrapper: status code and message alongside the payload
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(rename = "msg", default)]
    pub message: String,
    pub status: i32,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

impl<T> Envelope<T> {
    pub fn is_success(&self) -> bool {
        self.status == STATUS_OK
    }
}

/// One upstream catalog listing
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CatalogEntry {
    pub stock_id: String,
    pub stock_name: String,
    #[serde(default)]
    pub industry_category: Option<String>,
    #[serde(rename = "type", default)]
    pub listing_type: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

pub type CatalogEnvelope = Envelope<CatalogEntry>;

/// One trading day for one instrument
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DailyPrice {
    pub date: NaiveDate,
    pub stock_id: String,
    #[serde(rename = "Trading_Volume", default)]
    pub volume: i64,
    #[serde(rename = "Trading_money", default)]
    pub turnover: i64,
    pub open: Decimal,
    #[serde(rename = "max")]
    pub high: Decimal,
    #[serde(rename = "min")]
    pub low: Decimal,
    pub close: Decimal,
    /// Change against the previous close
    #[serde(default)]
    pub spread: Decimal,
}

/// News headline about an instrument
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct NewsItem {
    pub date: String,
    pub stock_id: String,
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub source: Option<String>,
}

/// Errors returned by upstream fetchers
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {provider} failed: {message}")]
    Request { provider: String, message: String },

    #[error("Request to {provider} timed out")]
    Timeout { provider: String },

    #[error("Failed to decode {provider} response: {message}")]
    Decode { provider: String, message: String },

    /// Envelope reported a non-success status
    #[error("{provider} returned status {status}: {message}")]
    Status {
        provider: String,
        status: i32,
        message: String,
    },
}

/// Source of the full symbol catalog for a market
#[async_trait]
pub trait CatalogFetcher: Send + Sync {
    /// Fetch the catalog envelope as-is; status interpretation is the caller's job
    async fn fetch_catalog(&self, market: Market) -> Result<CatalogEnvelope, FetchError>;
}

/// Price and news lookups used to build notification payloads
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Daily bar of one instrument; `None` when there was no trading that day
    async fn daily_price(&self, stock_id: &str, date: NaiveDate) -> Result<Option<DailyPrice>, FetchError>;

    /// Daily bars of every listed instrument for one date
    async fn market_prices(&self, date: NaiveDate) -> Result<Vec<DailyPrice>, FetchError>;

    /// Headlines about one instrument published on or after `since`
    async fn stock_news(&self, stock_id: &str, since: NaiveDate) -> Result<Vec<NewsItem>, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_catalog_envelope_decoding() {
        let body = r#"{
            "msg": "success",
            "status": 200,
            "data": [
                {"industry_category": "半導體業", "stock_id": "2330", "stock_name": "台積電", "type": "twse", "date": "2024-01-02"},
                {"industry_category": "ETF", "stock_id": "0050", "stock_name": "元大台灣50", "type": "twse", "date": "2024-01-02"}
            ]
        }"#;

        let envelope: CatalogEnvelope = serde_json::from_str(body).unwrap();
        assert!(envelope.is_success());
        assert_eq!(envelope.data.len(), 2);
        assert_eq!(envelope.data[0].stock_id, "2330");
        assert_eq!(envelope.data[1].listing_type.as_deref(), Some("twse"));
    }

    #[test]
    fn test_error_envelope_without_data() {
        let body = r#"{"msg": "Your level is register. Please update your user level.", "status": 402}"#;

        let envelope: CatalogEnvelope = serde_json::from_str(body).unwrap();
        assert!(!envelope.is_success());
        assert!(envelope.data.is_empty());
    }

    #[test]
    fn test_daily_price_decoding() {
        let body = r#"{
            "date": "2024-01-02", "stock_id": "2330", "Trading_Volume": 25000000,
            "Trading_money": 14750000000, "open": 590.0, "max": 593.0, "min": 589.0,
            "close": 593.0, "spread": 0.5, "Trading_turnover": 30000
        }"#;

        let price: DailyPrice = serde_json::from_str(body).unwrap();
        assert_eq!(price.close, dec!(593));
        assert_eq!(price.high, dec!(593));
        assert_eq!(price.spread, dec!(0.5));
        assert_eq!(price.volume, 25_000_000);
    }
}
