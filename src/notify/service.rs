use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;

use super::dispatcher::{DispatchReport, NotificationDispatcher};
use super::grouper::SubscriptionGrouper;
use super::payload::PayloadBuilder;
use super::TopicGroups;
use crate::database::enums::SubscriptionItem;
use crate::database::DatabaseError;

/// Outcome of one feature's notification run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureRun {
    Dispatched(DispatchReport),
    /// No eligible subscriptions
    NothingToSend,
    /// Subscriptions could not be read; nothing was sent
    LoadFailed(String),
}

impl FeatureRun {
    pub fn report(&self) -> Option<&DispatchReport> {
        match self {
            FeatureRun::Dispatched(report) => Some(report),
            _ => None,
        }
    }
}

/// Outcomes of one full notification run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRun {
    pub stock_price: FeatureRun,
    pub stock_news: FeatureRun,
    pub daily_market_info: FeatureRun,
    pub top_volume_items: FeatureRun,
}

/// One entry point per notification feature
///
/// Every call rebuilds its topic groups from the store, so repeated or
/// overlapping runs never share state.
pub struct NotificationService {
    grouper: Arc<SubscriptionGrouper>,
    dispatcher: NotificationDispatcher,
    payloads: PayloadBuilder,
    timezone: Tz,
}

impl NotificationService {
    pub fn new(
        grouper: SubscriptionGrouper,
        dispatcher: NotificationDispatcher,
        payloads: PayloadBuilder,
        timezone: Tz,
    ) -> Self {
        Self {
            grouper: Arc::new(grouper),
            dispatcher,
            payloads,
            timezone,
        }
    }

    /// Trading date in the market's timezone
    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.timezone).date_naive()
    }

    pub async fn notify_stock_price(&self) -> FeatureRun {
        self.notify(SubscriptionItem::StockPrice, self.today()).await
    }

    pub async fn notify_stock_news(&self) -> FeatureRun {
        self.notify(SubscriptionItem::StockNews, self.today()).await
    }

    pub async fn notify_daily_market_info(&self) -> FeatureRun {
        self.notify(SubscriptionItem::DailyMarketInfo, self.today()).await
    }

    pub async fn notify_top_volume_items(&self) -> FeatureRun {
        self.notify(SubscriptionItem::TopVolumeItems, self.today()).await
    }

    /// Run every feature concurrently
    pub async fn run_all(&self) -> NotificationRun {
        let (stock_price, stock_news, daily_market_info, top_volume_items) = tokio::join!(
            self.notify_stock_price(),
            self.notify_stock_news(),
            self.notify_daily_market_info(),
            self.notify_top_volume_items(),
        );

        NotificationRun {
            stock_price,
            stock_news,
            daily_market_info,
            top_volume_items,
        }
    }

    async fn notify(&self, item: SubscriptionItem, date: NaiveDate) -> FeatureRun {
        tracing::info!("🔔 Running {} notifications for {}", item, date);

        let groups = match self.load_groups(item).await {
            Ok(Some(groups)) => groups,
            Ok(None) => return FeatureRun::NothingToSend,
            Err(e) => {
                tracing::error!("❌ Failed to load {} subscriptions: {}", item, e);
                return FeatureRun::LoadFailed(e.to_string());
            }
        };

        let report = self
            .dispatcher
            .dispatch(groups, |topic| self.payloads.build(item, topic, date))
            .await;

        FeatureRun::Dispatched(report)
    }

    async fn load_groups(&self, item: SubscriptionItem) -> Result<Option<TopicGroups>, DatabaseError> {
        let grouper = Arc::clone(&self.grouper);
        tokio::task::spawn_blocking(move || {
            if item.is_symbol_scoped() {
                grouper.group_by_topic(Some(item))
            } else {
                grouper.group_by_feature(item)
            }
        })
        .await
        .map_err(|e| DatabaseError::QueryError(format!("subscription loader task failed: {}", e)))?
    }
}
