//! A provider that delivers messages through the Telegram Bot API.

use crate::errors::NotifyError;
use crate::message::{Message, Priority};
use crate::notifier::Notifier;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

const PROVIDER: &str = "telegram";

/// Configuration for the Telegram provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot API token issued by BotFather.
    pub bot_token: String,
    /// Default chat id messages are delivered to.
    pub chat_id: String,
    /// Parse mode for message text (`Markdown`, `HTML`, or empty for plain).
    #[serde(default = "default_parse_mode")]
    pub parse_mode: String,
    /// Base URL of the Bot API. Overridable for tests.
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

fn default_parse_mode() -> String {
    "Markdown".to_string()
}

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

/// Sends notifications via the Telegram Bot API over HTTP.
pub struct TelegramNotifier {
    config: TelegramConfig,
    client: reqwest::Client,
}

impl TelegramNotifier {
    /// Creates a Telegram notifier, validating the configuration.
    pub fn new(config: TelegramConfig) -> Result<Self, NotifyError> {
        if config.bot_token.is_empty() {
            return Err(NotifyError::provider(PROVIDER, "bot token is required"));
        }
        if config.chat_id.is_empty() {
            return Err(NotifyError::provider(PROVIDER, "chat id is required"));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                NotifyError::provider_with_source(PROVIDER, "failed to build http client", e)
            })?;

        Ok(Self { config, client })
    }

    /// Sends a photo with a caption, falling back to the default chat id
    /// when none is given.
    pub async fn send_photo(
        &self,
        ctx: &CancellationToken,
        chat_id: Option<&str>,
        photo_url: &str,
        caption: &str,
    ) -> Result<(), NotifyError> {
        let payload = json!({
            "chat_id": chat_id.unwrap_or(&self.config.chat_id),
            "photo": photo_url,
            "caption": caption,
        });
        self.call(ctx, "sendPhoto", &payload).await
    }

    /// Posts one Bot API method call and checks both the HTTP status and
    /// the `{ok, description}` response envelope.
    async fn call(
        &self,
        ctx: &CancellationToken,
        method: &str,
        payload: &Value,
    ) -> Result<(), NotifyError> {
        let url = format!(
            "{}/bot{}/{}",
            self.config.api_base, self.config.bot_token, method
        );

        // The whole exchange, body reads included, races cancellation, so
        // a cancelled send never lingers on a slow response.
        let exchange = async {
            let response = self
                .client
                .post(&url)
                .json(payload)
                .send()
                .await
                .map_err(|e| {
                    NotifyError::provider_with_source(PROVIDER, "failed to send request", e)
                })?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(NotifyError::provider(
                    PROVIDER,
                    format!("api request failed with status {status}: {body}"),
                ));
            }

            let envelope: ApiResponse = response.json().await.map_err(|e| {
                NotifyError::provider_with_source(PROVIDER, "failed to parse response", e)
            })?;
            if !envelope.ok {
                return Err(NotifyError::provider(
                    PROVIDER,
                    format!(
                        "api returned error: {}",
                        envelope.description.unwrap_or_default()
                    ),
                ));
            }
            Ok(())
        };

        tokio::select! {
            _ = ctx.cancelled() => {
                return Err(NotifyError::provider(PROVIDER, "send cancelled"));
            }
            result = exchange => result?,
        }

        debug!(method, "telegram api call succeeded");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn send(&self, ctx: &CancellationToken, text: &str) -> Result<(), NotifyError> {
        self.send_with_options(ctx, &Message::new(text)).await
    }

    #[instrument(skip(self, ctx, msg))]
    async fn send_with_options(
        &self,
        ctx: &CancellationToken,
        msg: &Message,
    ) -> Result<(), NotifyError> {
        if msg.text.is_empty() {
            return Err(NotifyError::provider(PROVIDER, "message text is required"));
        }

        let chat_id = msg.channel.as_deref().unwrap_or(&self.config.chat_id);
        let text = match &msg.title {
            Some(title) => format!("*{title}*\n\n{}", msg.text),
            None => msg.text.clone(),
        };

        let mut payload = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": self.config.parse_mode,
        });
        if msg.priority == Priority::Low {
            payload["disable_notification"] = Value::Bool(true);
        }

        self.call(ctx, "sendMessage", &payload).await
    }
}
