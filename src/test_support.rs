//! Shared fakes for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::database::enums::{Market, SubscriptionItem};
use crate::database::models::{NewSymbol, Subscription, SubscriptionSymbol, Symbol, User};
use crate::database::repositories::{
    SubscriptionRepository, SubscriptionSymbolRepository, SymbolRepository, UpsertSummary,
    UserRepository,
};
use crate::database::DatabaseError;
use crate::notify::{ChatId, InlineKeyboard, MessageSender, SendError};
use crate::providers::{
    CatalogEntry, CatalogEnvelope, CatalogFetcher, DailyPrice, Envelope, FetchError, NewsItem,
    QuoteSource, STATUS_OK,
};

// ---------------------------------------------------------------------------
// Catalog sync
// ---------------------------------------------------------------------------

/// `n` records with distinct codes
pub fn symbols(n: usize, market: Market) -> Vec<NewSymbol> {
    (0..n)
        .map(|i| NewSymbol::new(format!("{:05}", i), format!("Listing {}", i), market))
        .collect()
}

pub fn catalog_entries(n: usize) -> Vec<CatalogEntry> {
    (0..n)
        .map(|i| CatalogEntry {
            stock_id: format!("{:04}", 1000 + i),
            stock_name: format!("Listing {}", i),
            industry_category: Some("Semiconductor".to_string()),
            listing_type: Some("twse".to_string()),
            date: Some("2024-01-02".to_string()),
        })
        .collect()
}

/// Symbol store whose behavior is scripted per call number (1-based)
#[derive(Default)]
pub struct ScriptedSymbolRepository {
    calls: AtomicUsize,
    fail_calls: HashSet<usize>,
    partial_calls: HashMap<usize, usize>,
    over_report: usize,
    delay: Option<Duration>,
    stored: Mutex<HashMap<(String, Market), String>>,
    failed_call_size: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedSymbolRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `n` fails outright without writing anything
    pub fn fail_call(mut self, n: usize) -> Self {
        self.fail_calls.insert(n);
        self
    }

    /// Call `n` rejects its last `rejected` records
    pub fn partial_call(mut self, n: usize, rejected: usize) -> Self {
        self.partial_calls.insert(n, rejected);
        self
    }

    /// Every call claims `extra` more successes than records it received
    pub fn over_report(mut self, extra: usize) -> Self {
        self.over_report = extra;
        self
    }

    pub fn with_delay_ms(mut self, millis: u64) -> Self {
        self.delay = Some(Duration::from_millis(millis));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn stored(&self) -> usize {
        self.stored.lock().len()
    }

    /// Records handed to the calls scripted to fail
    pub fn failed_call_size(&self) -> usize {
        self.failed_call_size.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn upsert(&self, call: usize, records: &[NewSymbol]) -> Result<UpsertSummary, DatabaseError> {
        if self.fail_calls.contains(&call) {
            self.failed_call_size.fetch_add(records.len(), Ordering::SeqCst);
            return Err(DatabaseError::ConnectionPoolError("scripted failure".to_string()));
        }

        let rejected = self
            .partial_calls
            .get(&call)
            .copied()
            .unwrap_or(0)
            .min(records.len());
        let accepted = records.len() - rejected;

        let mut summary = UpsertSummary::default();
        let mut stored = self.stored.lock();
        for record in &records[..accepted] {
            stored.insert((record.symbol.clone(), record.market), record.name.clone());
            summary.record_success();
        }
        for record in &records[accepted..] {
            summary.record_failure(format!("scripted rejection of {}", record.symbol));
        }
        summary.succeeded += self.over_report;

        Ok(summary)
    }
}

impl SymbolRepository for ScriptedSymbolRepository {
    fn batch_upsert(&self, new_symbols: &[NewSymbol]) -> Result<UpsertSummary, DatabaseError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        let result = self.upsert(call, new_symbols);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn get_market_stats(&self) -> Result<HashMap<Market, i64>, DatabaseError> {
        let mut stats = HashMap::new();
        for (_, market) in self.stored.lock().keys() {
            *stats.entry(*market).or_insert(0) += 1;
        }
        Ok(stats)
    }

    fn find_by_code(&self, _symbol: &str, _market: Market) -> Result<Option<Symbol>, DatabaseError> {
        Ok(None)
    }
}

enum CatalogResponse {
    Entries(Vec<CatalogEntry>),
    Status(i32, String),
    Unreachable,
}

pub struct StubCatalogFetcher {
    response: CatalogResponse,
    calls: AtomicUsize,
}

impl StubCatalogFetcher {
    pub fn ok(entries: Vec<CatalogEntry>) -> Self {
        Self::with(CatalogResponse::Entries(entries))
    }

    /// Envelope with a non-success status and no data
    pub fn status(status: i32, message: &str) -> Self {
        Self::with(CatalogResponse::Status(status, message.to_string()))
    }

    pub fn unreachable() -> Self {
        Self::with(CatalogResponse::Unreachable)
    }

    fn with(response: CatalogResponse) -> Self {
        Self {
            response,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogFetcher for StubCatalogFetcher {
    async fn fetch_catalog(&self, _market: Market) -> Result<CatalogEnvelope, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.response {
            CatalogResponse::Entries(entries) => Ok(Envelope {
                message: "success".to_string(),
                status: STATUS_OK,
                data: entries.clone(),
            }),
            CatalogResponse::Status(status, message) => Ok(Envelope {
                message: message.clone(),
                status: *status,
                data: Vec::new(),
            }),
            CatalogResponse::Unreachable => Err(FetchError::Request {
                provider: "stub".to_string(),
                message: "connection refused".to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Subscriptions and users
// ---------------------------------------------------------------------------

fn symbol_row(code: &str) -> Symbol {
    Symbol {
        id: code.bytes().fold(0i64, |acc, b| acc * 31 + b as i64),
        symbol: code.to_string(),
        name: format!("{} Corp", code),
        market: Market::Taiwan,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Active subscription of `user_id` to `item`
pub fn subscription(user_id: i64, item: SubscriptionItem) -> Subscription {
    Subscription {
        id: user_id * 10 + i64::from(item.id()),
        user_id,
        item,
        status: true,
        created_at: Utc::now(),
    }
}

/// Fully resolved join row
pub fn join_row(user_id: i64, code: &str, item: SubscriptionItem) -> SubscriptionSymbol {
    let subscription = subscription(user_id, item);
    SubscriptionSymbol {
        subscription_id: subscription.id,
        symbol: Some(symbol_row(code)),
        subscription: Some(subscription),
    }
}

/// Join row whose references may be dangling
pub fn orphan_join_row(subscription_id: i64, code: Option<&str>, user_id: Option<i64>) -> SubscriptionSymbol {
    SubscriptionSymbol {
        subscription_id,
        symbol: code.map(symbol_row),
        subscription: user_id.map(|id| subscription(id, SubscriptionItem::StockPrice)),
    }
}

#[derive(Default)]
pub struct MockSubscriptionSymbolRepository {
    rows: Vec<SubscriptionSymbol>,
    fail: bool,
}

impl MockSubscriptionSymbolRepository {
    pub fn new(rows: Vec<SubscriptionSymbol>) -> Self {
        Self { rows, fail: false }
    }

    pub fn failing() -> Self {
        Self {
            rows: Vec::new(),
            fail: true,
        }
    }
}

impl SubscriptionSymbolRepository for MockSubscriptionSymbolRepository {
    fn get_all(&self) -> Result<Vec<SubscriptionSymbol>, DatabaseError> {
        if self.fail {
            return Err(DatabaseError::QueryError("subscription table unavailable".to_string()));
        }
        Ok(self.rows.clone())
    }
}

#[derive(Default)]
pub struct MockSubscriptionRepository {
    subscriptions: Vec<Subscription>,
}

impl MockSubscriptionRepository {
    pub fn new(subscriptions: Vec<Subscription>) -> Self {
        Self { subscriptions }
    }
}

impl SubscriptionRepository for MockSubscriptionRepository {
    fn get_by_feature(&self, item: SubscriptionItem) -> Result<Vec<Subscription>, DatabaseError> {
        Ok(self
            .subscriptions
            .iter()
            .filter(|s| s.item == item && s.status)
            .cloned()
            .collect())
    }
}

pub fn user(id: i64, account_id: &str) -> User {
    User {
        id,
        account_id: account_id.to_string(),
        user_name: Some(format!("user{}", id)),
        status: true,
        created_at: Utc::now(),
    }
}

pub fn disabled_user(id: i64, account_id: &str) -> User {
    User {
        status: false,
        ..user(id, account_id)
    }
}

#[derive(Default)]
pub struct MockUserRepository {
    users: HashMap<i64, User>,
    failing_ids: HashSet<i64>,
}

impl MockUserRepository {
    pub fn new(users: Vec<User>) -> Self {
        Self {
            users: users.into_iter().map(|u| (u.id, u)).collect(),
            failing_ids: HashSet::new(),
        }
    }

    /// Lookups of `user_id` return a database error
    pub fn failing_for(mut self, user_id: i64) -> Self {
        self.failing_ids.insert(user_id);
        self
    }
}

impl UserRepository for MockUserRepository {
    fn get_by_id(&self, user_id: i64) -> Result<Option<User>, DatabaseError> {
        if self.failing_ids.contains(&user_id) {
            return Err(DatabaseError::ConnectionFailed("user lookup failed".to_string()));
        }
        Ok(self.users.get(&user_id).cloned())
    }
}

// ---------------------------------------------------------------------------
// Delivery and quotes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SentMessage {
    pub chat: ChatId,
    pub text: String,
    pub keyboard: Option<InlineKeyboard>,
}

/// Sender that records every successful delivery
#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<SentMessage>>,
    failing_chats: HashSet<i64>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(mut self, chat_id: i64) -> Self {
        self.failing_chats.insert(chat_id);
        self
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().clone()
    }

    fn record(&self, chat: ChatId, text: &str, keyboard: Option<&InlineKeyboard>) -> Result<(), SendError> {
        if self.failing_chats.contains(&chat.0) {
            return Err(SendError::Rejected {
                status: 403,
                description: "Forbidden: bot was blocked by the user".to_string(),
            });
        }
        self.sent.lock().push(SentMessage {
            chat,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(())
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send(&self, chat: ChatId, text: &str) -> Result<(), SendError> {
        self.record(chat, text, None)
    }

    async fn send_with_keyboard(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: &InlineKeyboard,
    ) -> Result<(), SendError> {
        self.record(chat, text, Some(keyboard))
    }
}

pub fn daily_price(stock_id: &str, close: Decimal, volume: i64) -> DailyPrice {
    DailyPrice {
        date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        stock_id: stock_id.to_string(),
        volume,
        turnover: volume * 100,
        open: close,
        high: close,
        low: close,
        close,
        spread: Decimal::ONE,
    }
}

pub fn news_item(stock_id: &str, title: &str) -> NewsItem {
    NewsItem {
        date: "2024-01-02 09:30:00".to_string(),
        stock_id: stock_id.to_string(),
        title: title.to_string(),
        link: format!("https://news.example/{}/{}", stock_id, title.len()),
        source: Some("stub".to_string()),
    }
}

/// Quote source answering from fixed data for any date
#[derive(Default)]
pub struct StubQuoteSource {
    prices: HashMap<String, DailyPrice>,
    news: Vec<NewsItem>,
    market: Vec<DailyPrice>,
    fail: bool,
}

impl StubQuoteSource {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with_price(mut self, price: DailyPrice) -> Self {
        self.prices.insert(price.stock_id.clone(), price);
        self
    }

    pub fn with_news(mut self, news: Vec<NewsItem>) -> Self {
        self.news = news;
        self
    }

    pub fn with_market(mut self, market: Vec<DailyPrice>) -> Self {
        self.market = market;
        self
    }

    fn check(&self) -> Result<(), FetchError> {
        if self.fail {
            return Err(FetchError::Timeout {
                provider: "stub".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl QuoteSource for StubQuoteSource {
    async fn daily_price(&self, stock_id: &str, _date: NaiveDate) -> Result<Option<DailyPrice>, FetchError> {
        self.check()?;
        Ok(self.prices.get(stock_id).cloned())
    }

    async fn market_prices(&self, _date: NaiveDate) -> Result<Vec<DailyPrice>, FetchError> {
        self.check()?;
        Ok(self.market.clone())
    }

    async fn stock_news(&self, stock_id: &str, _since: NaiveDate) -> Result<Vec<NewsItem>, FetchError> {
        self.check()?;
        Ok(self.news.iter().filter(|n| n.stock_id == stock_id).cloned().collect())
    }
}
