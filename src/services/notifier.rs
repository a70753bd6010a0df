//! Chat notification delivery.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::TelegramConfig;

/// A message could not be delivered.
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// Transport failure (connection, timeout, unreadable response)
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The chat service answered but refused the message
    #[error("rejected with status {status}: {description}")]
    Rejected { status: u16, description: String },
}

/// Sends rendered HTML messages to opaque chat destinations.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, destination: &str, message: &str) -> Result<(), DeliveryError>;
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram Bot API `sendMessage` client.
pub struct TelegramNotifier {
    client: Client,
    endpoint: String,
    disable_preview: bool,
}

impl TelegramNotifier {
    pub fn new(client: Client, config: &TelegramConfig, token: &str) -> Self {
        Self {
            client,
            endpoint: format!(
                "{}/bot{}/sendMessage",
                config.api_url.trim_end_matches('/'),
                token
            ),
            disable_preview: config.disable_web_page_preview,
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, destination: &str, message: &str) -> Result<(), DeliveryError> {
        let payload = SendMessage {
            chat_id: destination,
            text: message,
            parse_mode: "HTML",
            disable_web_page_preview: self.disable_preview,
        };

        let response = self.client.post(&self.endpoint).json(&payload).send().await?;
        let status = response.status();
        let body = response.text().await?;
        let parsed: Option<ApiResponse> = serde_json::from_str(&body).ok();

        match parsed {
            Some(api) if status.is_success() && api.ok => Ok(()),
            Some(api) => Err(DeliveryError::Rejected {
                status: status.as_u16(),
                description: api.description.unwrap_or(body),
            }),
            None => Err(DeliveryError::Rejected {
                status: status.as_u16(),
                description: body,
            }),
        }
    }
}

/// Writes messages to the log instead of sending them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, destination: &str, message: &str) -> Result<(), DeliveryError> {
        log::info!("[dry-run] message for {}:\n{}", destination, message);
        Ok(())
    }
}
