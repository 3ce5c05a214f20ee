//! FinMind open data client.
//!
//! Serves the Taiwan/US stock catalogs, daily prices and news through the
//! `/api/v4/data` endpoint. All datasets share the same envelope shape.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{
    CatalogEnvelope, CatalogFetcher, DailyPrice, Envelope, FetchError, NewsItem, QuoteSource,
};
use crate::database::enums::Market;

const PROVIDER_ID: &str = "FinMind";
pub const DEFAULT_BASE_URL: &str = "https://api.finmindtrade.com/api/v4";

pub struct FinMindClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl FinMindClient {
    /// Create a client; an empty token falls back to anonymous access
    pub fn new(base_url: impl Into<String>, token: Option<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| FetchError::Request {
            provider: PROVIDER_ID.to_string(),
            message: format!("Failed to build HTTP client: {}", e),
        })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    fn catalog_dataset(market: Market) -> &'static str {
        match market {
            Market::Taiwan => "TaiwanStockInfo",
            Market::UnitedStates => "USStockInfo",
        }
    }

    /// GET one dataset and decode its envelope
    async fn fetch<T: DeserializeOwned>(
        &self,
        dataset: &str,
        params: &[(&str, String)],
    ) -> Result<Envelope<T>, FetchError> {
        let url = format!("{}/data", self.base_url);

        let mut request = self.client.get(&url).query(&[("dataset", dataset)]);
        for (key, value) in params {
            request = request.query(&[(key, value)]);
        }
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        debug!("FinMind request: dataset={} with {} params", dataset, params.len());

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    provider: PROVIDER_ID.to_string(),
                }
            } else {
                FetchError::Request {
                    provider: PROVIDER_ID.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let body = response.text().await.map_err(|e| FetchError::Request {
            provider: PROVIDER_ID.to_string(),
            message: format!("Failed to read body: {}", e),
        })?;

        // FinMind reports errors inside the envelope, often with a non-2xx
        // HTTP status as well, so decode regardless of the HTTP status.
        serde_json::from_str::<Envelope<T>>(&body).map_err(|e| FetchError::Decode {
            provider: PROVIDER_ID.to_string(),
            message: e.to_string(),
        })
    }

    /// Like `fetch` but treats a non-success envelope as an error
    async fn fetch_ok<T: DeserializeOwned>(
        &self,
        dataset: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<T>, FetchError> {
        let envelope = self.fetch::<T>(dataset, params).await?;
        if !envelope.is_success() {
            return Err(FetchError::Status {
                provider: PROVIDER_ID.to_string(),
                status: envelope.status,
                message: envelope.message,
            });
        }
        Ok(envelope.data)
    }
}

#[async_trait]
impl CatalogFetcher for FinMindClient {
    async fn fetch_catalog(&self, market: Market) -> Result<CatalogEnvelope, FetchError> {
        self.fetch(Self::catalog_dataset(market), &[]).await
    }
}

#[async_trait]
impl QuoteSource for FinMindClient {
    async fn daily_price(&self, stock_id: &str, date: NaiveDate) -> Result<Option<DailyPrice>, FetchError> {
        let day = date.format("%Y-%m-%d").to_string();
        let prices = self
            .fetch_ok::<DailyPrice>(
                "TaiwanStockPrice",
                &[
                    ("data_id", stock_id.to_string()),
                    ("start_date", day.clone()),
                    ("end_date", day),
                ],
            )
            .await?;

        Ok(prices.into_iter().find(|p| p.date == date))
    }

    async fn market_prices(&self, date: NaiveDate) -> Result<Vec<DailyPrice>, FetchError> {
        self.fetch_ok(
            "TaiwanStockPrice",
            &[("start_date", date.format("%Y-%m-%d").to_string())],
        )
        .await
    }

    async fn stock_news(&self, stock_id: &str, since: NaiveDate) -> Result<Vec<NewsItem>, FetchError> {
        self.fetch_ok(
            "TaiwanStockNews",
            &[
                ("data_id", stock_id.to_string()),
                ("start_date", since.format("%Y-%m-%d").to_string()),
            ],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_dataset_per_market() {
        assert_eq!(FinMindClient::catalog_dataset(Market::Taiwan), "TaiwanStockInfo");
        assert_eq!(FinMindClient::catalog_dataset(Market::UnitedStates), "USStockInfo");
    }

    #[test]
    fn test_client_normalizes_base_url_and_token() {
        let client = FinMindClient::new(
            "https://api.finmindtrade.com/api/v4/",
            Some(String::new()),
            Duration::from_secs(5),
        )
        .unwrap();

        assert_eq!(client.base_url, "https://api.finmindtrade.com/api/v4");
        assert!(client.token.is_none());
    }
}
