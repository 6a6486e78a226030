use super::ChannelError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Mutex;

/// A channel that delivers the same text to fixed destinations, e.g. bot
/// groups and channels
#[async_trait::async_trait]
pub trait IBroadcastChannel: Send + Sync {
    async fn send_message(&self, destination: &str, text: &str) -> Result<(), ChannelError>;
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram Bot API client
pub struct TelegramBotApi {
    client: Client,
    api_url: String,
    bot_token: String,
}

impl TelegramBotApi {
    pub fn new(api_url: String, bot_token: String) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            bot_token,
        }
    }
}

#[async_trait::async_trait]
impl IBroadcastChannel for TelegramBotApi {
    async fn send_message(&self, destination: &str, text: &str) -> Result<(), ChannelError> {
        let url = format!("{}/bot{}/sendMessage", self.api_url, self.bot_token);
        let res = self
            .client
            .post(&url)
            .json(&SendMessageRequest {
                chat_id: destination,
                text,
                parse_mode: "HTML",
                disable_web_page_preview: false,
            })
            .send()
            .await
            .map_err(|e| ChannelError::Network(e.without_url().to_string()))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| ChannelError::Network(e.without_url().to_string()))?;
        match serde_json::from_str::<TelegramResponse>(&body) {
            Ok(reply) if status.is_success() && reply.ok => Ok(()),
            Ok(reply) => Err(ChannelError::Rejected {
                status: status.as_u16(),
                message: reply
                    .description
                    .unwrap_or_else(|| "Telegram responded with ok: false".into()),
            }),
            // Not a Bot API answer, e.g. an error page from a proxy in between
            Err(_) => Err(ChannelError::Rejected {
                status: status.as_u16(),
                message: body,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BroadcastMessage {
    pub destination: String,
    pub text: String,
}

/// Records every message instead of sending it. Destinations marked as
/// failing reject their messages.
pub struct InMemoryBroadcastChannel {
    attempts: Mutex<Vec<BroadcastMessage>>,
    failing_destinations: Mutex<HashSet<String>>,
}

impl InMemoryBroadcastChannel {
    pub fn new() -> Self {
        Self {
            attempts: Mutex::new(Vec::new()),
            failing_destinations: Mutex::new(HashSet::new()),
        }
    }

    pub fn fail_destination(&self, destination: &str) {
        self.failing_destinations
            .lock()
            .unwrap()
            .insert(destination.to_string());
    }

    /// Every message handed to this channel, including rejected ones
    pub fn attempts(&self) -> Vec<BroadcastMessage> {
        self.attempts.lock().unwrap().clone()
    }
}

impl Default for InMemoryBroadcastChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IBroadcastChannel for InMemoryBroadcastChannel {
    async fn send_message(&self, destination: &str, text: &str) -> Result<(), ChannelError> {
        self.attempts.lock().unwrap().push(BroadcastMessage {
            destination: destination.to_string(),
            text: text.to_string(),
        });
        if self.failing_destinations.lock().unwrap().contains(destination) {
            return Err(ChannelError::Rejected {
                status: 400,
                message: "Bad Request: chat not found".into(),
            });
        }
        Ok(())
    }
}
