use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;

use super::{format, Message, TopicKey};
use crate::database::enums::{Market, SubscriptionItem};
use crate::database::repositories::SymbolRepository;
use crate::providers::{FetchError, QuoteSource};

/// Index code FinMind uses for the weighted TAIEX series
pub const TAIEX_ID: &str = "TAIEX";

/// Index series that appear among daily prices but are not tradable
const INDEX_IDS: [&str; 2] = [TAIEX_ID, "TPEx"];

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("No {item} data for {topic} on {date}")]
    NoData {
        item: SubscriptionItem,
        topic: TopicKey,
        date: NaiveDate,
    },

    #[error("{item} cannot be built for {topic}")]
    UnsupportedTopic { item: SubscriptionItem, topic: TopicKey },
}

fn no_data(item: SubscriptionItem, topic: TopicKey, date: NaiveDate) -> PayloadError {
    PayloadError::NoData { item, topic, date }
}

/// Builds the message for one topic of one notification feature
pub struct PayloadBuilder {
    quotes: Arc<dyn QuoteSource>,
    symbols: Arc<dyn SymbolRepository>,
    news_limit: usize,
    top_volume_limit: usize,
}

impl PayloadBuilder {
    pub fn new(quotes: Arc<dyn QuoteSource>, symbols: Arc<dyn SymbolRepository>) -> Self {
        Self {
            quotes,
            symbols,
            news_limit: 5,
            top_volume_limit: 20,
        }
    }

    pub async fn build(
        &self,
        item: SubscriptionItem,
        topic: TopicKey,
        date: NaiveDate,
    ) -> Result<Message, PayloadError> {
        match (item, topic) {
            (SubscriptionItem::StockPrice, TopicKey::Symbol(code)) => {
                let Some(price) = self.quotes.daily_price(&code, date).await? else {
                    return Err(no_data(item, TopicKey::Symbol(code), date));
                };
                let name = self.display_name(&code).await;
                Ok(Message::text(format::price_summary(&code, name.as_deref(), &price)))
            }
            (SubscriptionItem::StockNews, TopicKey::Symbol(code)) => {
                let news = self.quotes.stock_news(&code, date).await?;
                if news.is_empty() {
                    return Err(no_data(item, TopicKey::Symbol(code), date));
                }
                let name = self.display_name(&code).await;
                Ok(format::news_digest(&code, name.as_deref(), &news, self.news_limit))
            }
            (
                SubscriptionItem::DailyMarketInfo,
                topic @ TopicKey::Feature(SubscriptionItem::DailyMarketInfo),
            ) => {
                let Some(index) = self.quotes.daily_price(TAIEX_ID, date).await? else {
                    return Err(no_data(item, topic, date));
                };
                Ok(Message::text(format::market_summary(&index)))
            }
            (
                SubscriptionItem::TopVolumeItems,
                topic @ TopicKey::Feature(SubscriptionItem::TopVolumeItems),
            ) => {
                let prices: Vec<_> = self
                    .quotes
                    .market_prices(date)
                    .await?
                    .into_iter()
                    .filter(|p| !INDEX_IDS.contains(&p.stock_id.as_str()))
                    .collect();
                if prices.is_empty() {
                    return Err(no_data(item, topic, date));
                }
                Ok(Message::text(format::top_volume_table(&prices, self.top_volume_limit)))
            }
            (item, topic) => Err(PayloadError::UnsupportedTopic { item, topic }),
        }
    }

    /// Catalog name of a Taiwan symbol; lookup failures only cost the name
    async fn display_name(&self, code: &str) -> Option<String> {
        let symbols = Arc::clone(&self.symbols);
        let code = code.to_string();

        match tokio::task::spawn_blocking(move || symbols.find_by_code(&code, Market::Taiwan)).await {
            Ok(Ok(symbol)) => symbol.map(|s| s.name),
            Ok(Err(e)) => {
                tracing::debug!("Symbol name lookup failed: {}", e);
                None
            }
            Err(e) => {
                tracing::debug!("Symbol name lookup task failed: {}", e);
                None
            }
        }
    }
}
