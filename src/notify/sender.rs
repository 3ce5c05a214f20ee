use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use thiserror::Error;

use super::InlineKeyboard;
use crate::database::DatabaseError;

/// Numeric chat identity messages are delivered to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ChatId {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(ChatId)
            .map_err(|_| ResolveError::InvalidIdentity(s.to_string()))
    }
}

/// Why a recipient user ID could not be turned into a [`ChatId`]
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("User {0} not found")]
    UserNotFound(i64),

    #[error("User {0} is disabled")]
    Disabled(i64),

    #[error("Invalid delivery identity: {0:?}")]
    InvalidIdentity(String),

    #[error("User lookup failed: {0}")]
    Lookup(#[from] DatabaseError),
}

#[derive(Debug, Error)]
pub enum SendError {
    #[error("Chat request failed: {0}")]
    Request(String),

    #[error("Chat API rejected message ({status}): {description}")]
    Rejected { status: u16, description: String },
}

/// Chat delivery seam
///
/// One call delivers one message to one chat; callers handle fan-out.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, chat: ChatId, text: &str) -> Result<(), SendError>;

    async fn send_with_keyboard(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: &InlineKeyboard,
    ) -> Result<(), SendError>;
}
