//! Subscription fan-out notifications.
//!
//! A notification cycle groups subscribers by topic ([`grouper`]), builds one
//! payload per topic ([`payload`]) and delivers it to every reachable
//! subscriber ([`dispatcher`]) through a chat [`sender`]. [`service`] exposes
//! one entry point per notification feature.

pub mod dispatcher;
pub mod format;
pub mod grouper;
pub mod payload;
pub mod sender;
pub mod service;
pub mod telegram;

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::Serialize;

use crate::database::enums::SubscriptionItem;

pub use dispatcher::{DispatchReport, NotificationDispatcher};
pub use grouper::SubscriptionGrouper;
pub use payload::{PayloadBuilder, PayloadError};
pub use sender::{ChatId, MessageSender, ResolveError, SendError};
pub use service::{FeatureRun, NotificationRun, NotificationService};
pub use telegram::TelegramSender;

/// Grouping key for fan-out
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TopicKey {
    /// Per-symbol topic, keyed by symbol code
    Symbol(String),
    /// Broadcast topic for a whole feature
    Feature(SubscriptionItem),
}

impl fmt::Display for TopicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopicKey::Symbol(code) => write!(f, "symbol:{}", code),
            TopicKey::Feature(item) => write!(f, "feature:{}", item),
        }
    }
}

/// Recipient user IDs per topic, rebuilt on every cycle
pub type TopicGroups = HashMap<TopicKey, BTreeSet<i64>>;

/// Inline keyboard attached to a chat message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InlineKeyboard {
    pub inline_keyboard: Vec<Vec<InlineButton>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineButton {
    pub text: String,
    pub url: String,
}

impl InlineKeyboard {
    /// One link button per row
    pub fn from_links<I>(links: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            inline_keyboard: links
                .into_iter()
                .map(|(text, url)| vec![InlineButton { text, url }])
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inline_keyboard.is_empty()
    }
}

/// Formatted payload delivered to every subscriber of a topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub text: String,
    pub keyboard: Option<InlineKeyboard>,
}

impl Message {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(text: impl Into<String>, keyboard: InlineKeyboard) -> Self {
        Self {
            text: text.into(),
            keyboard: Some(keyboard).filter(|k| !k.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_key_display() {
        assert_eq!(TopicKey::Symbol("2330".to_string()).to_string(), "symbol:2330");
        assert_eq!(
            TopicKey::Feature(SubscriptionItem::TopVolumeItems).to_string(),
            "feature:top_volume_items"
        );
    }

    #[test]
    fn test_topic_keys_sort_symbols_before_features() {
        let mut keys = vec![
            TopicKey::Feature(SubscriptionItem::TopVolumeItems),
            TopicKey::Symbol("2330".to_string()),
            TopicKey::Feature(SubscriptionItem::DailyMarketInfo),
            TopicKey::Symbol("2317".to_string()),
        ];
        keys.sort();

        assert_eq!(
            keys,
            vec![
                TopicKey::Symbol("2317".to_string()),
                TopicKey::Symbol("2330".to_string()),
                TopicKey::Feature(SubscriptionItem::DailyMarketInfo),
                TopicKey::Feature(SubscriptionItem::TopVolumeItems),
            ]
        );
        assert!(SubscriptionItem::StockPrice < SubscriptionItem::TopVolumeItems);
    }

    #[test]
    fn test_keyboard_serializes_in_telegram_shape() {
        let keyboard = InlineKeyboard::from_links(vec![(
            "Read".to_string(),
            "https://example.com/a".to_string(),
        )]);

        let json = serde_json::to_value(&keyboard).unwrap();
        assert_eq!(json["inline_keyboard"][0][0]["text"], "Read");
        assert_eq!(json["inline_keyboard"][0][0]["url"], "https://example.com/a");
    }

    #[test]
    fn test_empty_keyboard_is_dropped() {
        let message = Message::with_keyboard("no news", InlineKeyboard::default());
        assert!(message.keyboard.is_none());
    }
}
