//! A provider that delivers messages to Slack, either through the Web API
//! with a bot token or through an incoming webhook.

use crate::errors::NotifyError;
use crate::message::Message;
use crate::notifier::Notifier;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

const PROVIDER: &str = "slack";

/// Configuration for the Slack provider.
///
/// Exactly one delivery mode is used: the Web API when `token` is set,
/// otherwise the incoming webhook. At least one of the two is required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    /// Bot or user OAuth token for the Web API.
    #[serde(default)]
    pub token: Option<String>,
    /// Incoming webhook URL, used when no token is configured.
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// Default channel to post to (e.g. `#general` or `@user`).
    #[serde(default)]
    pub default_channel: Option<String>,
    /// Bot username shown next to the message.
    #[serde(default)]
    pub username: Option<String>,
    /// Bot icon emoji (e.g. `:robot_face:`).
    #[serde(default)]
    pub icon_emoji: Option<String>,
    /// Base URL of the Web API. Overridable for tests.
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

fn default_api_base() -> String {
    "https://slack.com/api".to_string()
}

/// Sends notifications to Slack over HTTP.
pub struct SlackNotifier {
    config: SlackConfig,
    client: reqwest::Client,
}

impl SlackNotifier {
    /// Creates a Slack notifier, validating the configuration.
    pub fn new(config: SlackConfig) -> Result<Self, NotifyError> {
        if config.token.is_none() && config.webhook_url.is_none() {
            return Err(NotifyError::provider(
                PROVIDER,
                "either token or webhook url is required",
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                NotifyError::provider_with_source(PROVIDER, "failed to build http client", e)
            })?;

        Ok(Self { config, client })
    }

    /// Sends a message composed of raw Block Kit blocks, bypassing the
    /// [`Message`] shape entirely. Requires a Web API token.
    pub async fn send_blocks(
        &self,
        ctx: &CancellationToken,
        channel: Option<&str>,
        blocks: Vec<Value>,
    ) -> Result<(), NotifyError> {
        let token = self.api_token()?;
        let channel = self.resolve_channel(channel)?;

        let payload = json!({ "channel": channel, "blocks": blocks });
        let url = format!("{}/chat.postMessage", self.config.api_base);
        with_cancellation(ctx, async {
            let response = self
                .client
                .post(&url)
                .bearer_auth(token)
                .json(&payload)
                .send()
                .await
                .map_err(|e| {
                    NotifyError::provider_with_source(PROVIDER, "failed to send request", e)
                })?;
            check_api_response(response).await
        })
        .await?;

        debug!(channel, "slack blocks post succeeded");
        Ok(())
    }

    /// Uploads a file through the Web API, posting its contents as the
    /// `content` form field. Requires a Web API token.
    pub async fn send_file(
        &self,
        ctx: &CancellationToken,
        channel: Option<&str>,
        file_path: &Path,
        title: &str,
        comment: &str,
    ) -> Result<(), NotifyError> {
        let token = self.api_token()?;
        let channel = self.resolve_channel(channel)?;

        let content = tokio::fs::read_to_string(file_path)
            .await
            .map_err(|e| NotifyError::provider_with_source(PROVIDER, "failed to read file", e))?;
        let filename = file_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        let form = [
            ("channels", channel.to_string()),
            ("content", content),
            ("filename", filename),
            ("title", title.to_string()),
            ("initial_comment", comment.to_string()),
        ];
        let url = format!("{}/files.upload", self.config.api_base);
        with_cancellation(ctx, async {
            let response = self
                .client
                .post(&url)
                .bearer_auth(token)
                .form(&form)
                .send()
                .await
                .map_err(|e| {
                    NotifyError::provider_with_source(PROVIDER, "failed to send request", e)
                })?;
            check_api_response(response).await
        })
        .await?;

        debug!(channel, "slack file upload succeeded");
        Ok(())
    }

    /// Builds the message payload shared by both delivery modes.
    ///
    /// A title produces a header block plus a section block, built directly;
    /// the plain text stays in the payload as the client-side fallback.
    fn build_payload(&self, channel: Option<&str>, msg: &Message) -> Value {
        let mut payload = json!({ "text": msg.text });

        if let Some(channel) = channel {
            payload["channel"] = Value::String(channel.to_string());
        }
        if let Some(username) = &self.config.username {
            payload["username"] = Value::String(username.clone());
        }
        if let Some(icon_emoji) = &self.config.icon_emoji {
            payload["icon_emoji"] = Value::String(icon_emoji.clone());
        }
        if !msg.attachments.is_empty() {
            // Attachment field names already follow the Slack wire format.
            payload["attachments"] =
                serde_json::to_value(&msg.attachments).unwrap_or(Value::Null);
        }
        if let Some(title) = &msg.title {
            payload["blocks"] = json!([
                {
                    "type": "header",
                    "text": { "type": "plain_text", "text": title },
                },
                {
                    "type": "section",
                    "text": { "type": "mrkdwn", "text": msg.text },
                },
            ]);
        }

        payload
    }

    fn api_token(&self) -> Result<&str, NotifyError> {
        self.config
            .token
            .as_deref()
            .ok_or_else(|| NotifyError::provider(PROVIDER, "an api token is required for this operation"))
    }

    fn resolve_channel<'a>(&'a self, channel: Option<&'a str>) -> Result<&'a str, NotifyError> {
        channel
            .or(self.config.default_channel.as_deref())
            .ok_or_else(|| NotifyError::provider(PROVIDER, "channel is required"))
    }

    /// Posts through the Web API and checks the `{ok, error}` envelope.
    async fn send_via_api(
        &self,
        ctx: &CancellationToken,
        token: &str,
        msg: &Message,
    ) -> Result<(), NotifyError> {
        let channel = self.resolve_channel(msg.channel.as_deref())?;

        let payload = self.build_payload(Some(channel), msg);
        let url = format!("{}/chat.postMessage", self.config.api_base);
        with_cancellation(ctx, async {
            let response = self
                .client
                .post(&url)
                .bearer_auth(token)
                .json(&payload)
                .send()
                .await
                .map_err(|e| {
                    NotifyError::provider_with_source(PROVIDER, "failed to send request", e)
                })?;
            check_api_response(response).await
        })
        .await?;

        debug!(channel, "slack api post succeeded");
        Ok(())
    }

    /// Posts to the incoming webhook; only the HTTP status is meaningful.
    async fn send_via_webhook(
        &self,
        ctx: &CancellationToken,
        webhook_url: &str,
        msg: &Message,
    ) -> Result<(), NotifyError> {
        let payload = self.build_payload(msg.channel.as_deref(), msg);
        with_cancellation(ctx, async {
            let response = self
                .client
                .post(webhook_url)
                .json(&payload)
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
                    format!("webhook request failed with status {status}: {body}"),
                ));
            }
            Ok(())
        })
        .await?;

        debug!("slack webhook post succeeded");
        Ok(())
    }
}

/// Races the full HTTP exchange against cancellation. The body reads are
/// covered too, so a cancelled send never lingers on a slow response.
async fn with_cancellation<F>(ctx: &CancellationToken, op: F) -> Result<(), NotifyError>
where
    F: Future<Output = Result<(), NotifyError>>,
{
    tokio::select! {
        _ = ctx.cancelled() => Err(NotifyError::provider(PROVIDER, "send cancelled")),
        result = op => result,
    }
}

/// Checks the HTTP status and the Web API `{ok, error}` envelope.
async fn check_api_response(response: reqwest::Response) -> Result<(), NotifyError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(NotifyError::provider(
            PROVIDER,
            format!("api request failed with status {status}: {body}"),
        ));
    }

    let envelope: ApiResponse = response
        .json()
        .await
        .map_err(|e| NotifyError::provider_with_source(PROVIDER, "failed to parse response", e))?;
    if !envelope.ok {
        return Err(NotifyError::provider(
            PROVIDER,
            format!("api returned error: {}", envelope.error.unwrap_or_default()),
        ));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    error: Option<String>,
}

#[async_trait]
impl Notifier for SlackNotifier {
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

        if let Some(token) = self.config.token.as_deref() {
            self.send_via_api(ctx, token, msg).await
        } else if let Some(webhook_url) = self.config.webhook_url.as_deref() {
            self.send_via_webhook(ctx, webhook_url, msg).await
        } else {
            // Unreachable after construction-time validation.
            Err(NotifyError::provider(PROVIDER, "no delivery mode configured"))
        }
    }
}
