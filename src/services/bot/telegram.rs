// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::error::AppError;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

pub const TELEGRAM_API: &str = "https://api.telegram.org";

#[derive(Debug, Deserialize)]
struct TgResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<u16>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<Message>,
    pub data: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    pub username: Option<String>,
}

impl User {
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.first_name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub callback_data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

/// Minimal Bot API client for long polling.
#[derive(Clone)]
pub struct TelegramApi {
    client: Client,
    base: String,
}

impl TelegramApi {
    pub fn new(token: &str, poll_timeout_secs: u64) -> Result<Self, AppError> {
        Self::with_base_url(TELEGRAM_API, token, poll_timeout_secs)
    }

    pub fn with_base_url(api_url: &str, token: &str, poll_timeout_secs: u64) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(poll_timeout_secs + 10))
            .build()
            .map_err(|e| AppError::Initialization(format!("HTTP client build failed: {}", e)))?;
        Ok(Self {
            client,
            base: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<T, AppError> {
        let url = format!("{}/{}", self.base, method);
        let resp: TgResponse<T> = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Connection(format!("{method} request failed: {}", e.without_url())))?
            .json()
            .await
            .map_err(|e| AppError::Connection(format!("{method} decode failed: {}", e.without_url())))?;

        if !resp.ok {
            tracing::debug!(
                target: "telegram",
                method,
                description = resp.description.as_deref().unwrap_or_default(),
                "Bot API call refused"
            );
            return Err(AppError::ApiCall {
                provider: format!("telegram:{method}"),
                status: resp.error_code.unwrap_or(400),
            });
        }
        resp.result
            .ok_or_else(|| AppError::Connection(format!("{method}: empty result")))
    }

    pub async fn get_me(&self) -> Result<User, AppError> {
        self.call("getMe", json!({})).await
    }

    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>, AppError> {
        self.call(
            "getUpdates",
            json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message", "callback_query"],
            }),
        )
        .await
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        markup: Option<&InlineKeyboardMarkup>,
    ) -> Result<Message, AppError> {
        let mut body = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "Markdown",
            "disable_web_page_preview": true,
        });
        if let Some(markup) = markup {
            body["reply_markup"] = json!(markup);
        }
        self.call("sendMessage", body).await
    }

    /// Edit a bot message in place. Falls back to a new message when the
    /// original cannot be edited.
    pub async fn edit_message(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        markup: Option<&InlineKeyboardMarkup>,
    ) -> Result<(), AppError> {
        let mut body = json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": text,
            "parse_mode": "Markdown",
            "disable_web_page_preview": true,
        });
        if let Some(markup) = markup {
            body["reply_markup"] = json!(markup);
        }
        match self.call::<serde_json::Value>("editMessageText", body).await {
            Ok(_) => Ok(()),
            Err(AppError::ApiCall { .. }) => self.send_message(chat_id, text, markup).await.map(|_| ()),
            Err(e) => Err(e),
        }
    }

    pub async fn answer_callback(&self, callback_id: &str) -> Result<(), AppError> {
        self.call::<bool>("answerCallbackQuery", json!({ "callback_query_id": callback_id }))
            .await
            .map(|_| ())
    }

    pub async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), AppError> {
        self.call::<bool>(
            "deleteMessage",
            json!({ "chat_id": chat_id, "message_id": message_id }),
        )
        .await
        .map(|_| ())
    }
}
