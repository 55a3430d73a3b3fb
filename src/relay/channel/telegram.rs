//! Telegram Bot API channel adapter.
//!
//! Long-polls `getUpdates` and replies via `sendMessage`. An optional SOCKS5
//! proxy carries all Bot API traffic.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::relay::error::ChannelError;

use super::{IncomingMessage, MessageChannel};

const API_BASE: &str = "https://api.telegram.org";

/// Slack added to the HTTP timeout on top of the server-side long-poll wait.
const HTTP_TIMEOUT_SLACK: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct UpdatesResponse {
    ok: bool,
    #[serde(default)]
    result: Vec<Update>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    #[serde(default)]
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    chat: Chat,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram long-poll channel.
pub struct TelegramChannel {
    http: reqwest::Client,
    base: String,
    offset: i64,
    poll_timeout: Duration,
}

impl TelegramChannel {
    /// Build a channel for `token`. A non-empty `proxy` address routes all
    /// API traffic through SOCKS5.
    pub fn new(token: &str, proxy: &str, poll_timeout: Duration) -> Result<Self, ChannelError> {
        let mut builder = reqwest::Client::builder().timeout(poll_timeout + HTTP_TIMEOUT_SLACK);
        if !proxy.is_empty() {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url(proxy))?);
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            base: format!("{}/bot{}", API_BASE, token),
            offset: 0,
            poll_timeout,
        })
    }

    fn next_offset(current: i64, updates: &[Update]) -> i64 {
        updates
            .iter()
            .map(|update| update.update_id + 1)
            .max()
            .unwrap_or(current)
    }
}

/// Prefix bare `host:port` proxy addresses with the SOCKS5 scheme.
fn proxy_url(proxy: &str) -> String {
    if proxy.contains("://") {
        proxy.to_string()
    } else {
        format!("socks5://{}", proxy)
    }
}

#[async_trait]
impl MessageChannel for TelegramChannel {
    async fn poll(&mut self) -> Result<Vec<IncomingMessage>, ChannelError> {
        let response: UpdatesResponse = self
            .http
            .get(format!("{}/getUpdates", self.base))
            .query(&[
                ("offset", self.offset.to_string()),
                ("timeout", self.poll_timeout.as_secs().to_string()),
            ])
            .send()
            .await?
            .json()
            .await?;

        if !response.ok {
            return Err(ChannelError::Api(
                response
                    .description
                    .unwrap_or_else(|| "getUpdates rejected".to_string()),
            ));
        }

        self.offset = Self::next_offset(self.offset, &response.result);
        debug!("received {} update(s)", response.result.len());

        Ok(response
            .result
            .into_iter()
            .filter_map(|update| {
                update.message.map(|message| IncomingMessage {
                    conversation_id: message.chat.id,
                    text: message.text,
                })
            })
            .collect())
    }

    async fn reply(&self, message: &IncomingMessage, text: &str) -> Result<(), ChannelError> {
        let response: SendResponse = self
            .http
            .post(format!("{}/sendMessage", self.base))
            .json(&serde_json::json!({
                "chat_id": message.conversation_id,
                "text": text,
            }))
            .send()
            .await?
            .json()
            .await?;

        if !response.ok {
            return Err(ChannelError::Api(
                response
                    .description
                    .unwrap_or_else(|| "sendMessage rejected".to_string()),
            ));
        }

        Ok(())
    }
}
