use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// Chat user registered through one of the bot webhooks
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = crate::database::schema::users)]
pub struct User {
    pub id: i64,

    /// Platform account identifier; for Telegram this is the numeric chat ID
    pub account_id: String,

    pub user_name: Option<String>,

    /// Disabled users are kept but never notified
    pub status: bool,

    pub created_at: DateTime<Utc>,
}

impl User {
    /// Raw delivery identity string used by the chat sender
    pub fn delivery_identity(&self) -> &str {
        &self.account_id
    }
}
