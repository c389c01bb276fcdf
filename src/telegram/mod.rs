//! Minimal Telegram Bot API client: enough to receive commands and post
//! notifications.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::app::{RelayError, Result};

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Extra time allowed on top of the server-side long poll.
const LONG_POLL_MARGIN: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseMode {
    #[serde(rename = "HTML")]
    Html,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<ParseMode>,
}

#[derive(Serialize)]
struct GetUpdates {
    offset: i64,
    timeout: u64,
    allowed_updates: [&'static str; 1],
}

pub struct TelegramClient {
    client: Client,
    base_url: String,
}

impl TelegramClient {
    pub fn with_api_url(api_url: &str, token: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("rss-relay/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
        })
    }

    pub async fn get_me(&self) -> Result<User> {
        self.call("getMe", &serde_json::json!({}), None).await
    }

    /// Long-poll for updates with `update_id >= offset`.
    pub async fn get_updates(&self, offset: i64, long_poll: Duration) -> Result<Vec<Update>> {
        let request = GetUpdates {
            offset,
            timeout: long_poll.as_secs(),
            allowed_updates: ["message"],
        };
        self.call("getUpdates", &request, Some(long_poll + LONG_POLL_MARGIN))
            .await
    }

    pub async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<Message> {
        let request = SendMessage {
            chat_id,
            text,
            parse_mode,
        };
        self.call("sendMessage", &request, None).await
    }

    async fn call<B, T>(&self, method: &str, body: &B, timeout: Option<Duration>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self
            .client
            .post(format!("{}/{}", self.base_url, method))
            .json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        let reply: ApiResponse<T> = response.json().await?;

        if !reply.ok {
            return Err(RelayError::Transport(format!(
                "{} failed ({}): {}",
                method,
                status,
                reply.description.unwrap_or_else(|| "no description".into())
            )));
        }

        reply
            .result
            .ok_or_else(|| RelayError::Transport(format!("{} returned no result", method)))
    }
}
