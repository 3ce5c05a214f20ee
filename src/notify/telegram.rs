//! Telegram Bot API sender.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::sender::{ChatId, MessageSender, SendError};
use super::InlineKeyboard;

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<&'a InlineKeyboard>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

pub struct TelegramSender {
    client: Client,
    endpoint: String,
}

impl TelegramSender {
    pub fn new(api_url: &str, bot_token: &str, timeout: Duration) -> Result<Self, SendError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SendError::Request(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/bot{}/sendMessage",
                api_url.trim_end_matches('/'),
                bot_token
            ),
        })
    }

    async fn post(&self, request: SendMessageRequest<'_>) -> Result<(), SendError> {
        let chat_id = request.chat_id;
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| SendError::Request(e.without_url().to_string()))?;

        let status = response.status();
        let body: ApiResponse = response
            .json()
            .await
            .map_err(|e| SendError::Request(format!("Failed to decode response: {}", e)))?;

        if !status.is_success() || !body.ok {
            return Err(SendError::Rejected {
                status: status.as_u16(),
                description: body.description.unwrap_or_else(|| "unknown error".to_string()),
            });
        }

        tracing::debug!(chat_id, "Telegram message delivered");
        Ok(())
    }
}

#[async_trait]
impl MessageSender for TelegramSender {
    async fn send(&self, chat: ChatId, text: &str) -> Result<(), SendError> {
        self.post(SendMessageRequest {
            chat_id: chat.0,
            text,
            parse_mode: "HTML",
            disable_web_page_preview: true,
            reply_markup: None,
        })
        .await
    }

    async fn send_with_keyboard(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: &InlineKeyboard,
    ) -> Result<(), SendError> {
        self.post(SendMessageRequest {
            chat_id: chat.0,
            text,
            parse_mode: "HTML",
            disable_web_page_preview: true,
            reply_markup: Some(keyboard).filter(|k| !k.is_empty()),
        })
        .await
    }
}
