//! Verifies that cancelling a broadcast surfaces as per-provider failures
//! and never shortens the result stream.

use notify_hub::{Manager, SlackConfig, SlackNotifier, TelegramConfig, TelegramNotifier};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn cancelled_provider_reports_failure_while_others_complete() {
    let server = MockServer::start().await;
    // Telegram hangs well past the point of cancellation; Slack answers
    // immediately.
    Mock::given(method("POST"))
        .and(path("/botTOKEN/sendMessage"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "ok": true }))
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let manager = Manager::new();
    manager
        .register(Arc::new(
            TelegramNotifier::new(TelegramConfig {
                bot_token: "TOKEN".to_string(),
                chat_id: "42".to_string(),
                parse_mode: "Markdown".to_string(),
                api_base: server.uri(),
            })
            .unwrap(),
        ))
        .await
        .unwrap();
    manager
        .register(Arc::new(
            SlackNotifier::new(SlackConfig {
                token: None,
                webhook_url: Some(format!("{}/hook", server.uri())),
                default_channel: None,
                username: None,
                icon_emoji: None,
                api_base: "https://slack.com/api".to_string(),
            })
            .unwrap(),
        ))
        .await
        .unwrap();

    let ctx = CancellationToken::new();
    let mut rx = manager.broadcast_async(&ctx, "hi").await;

    let cancel = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
    });

    let mut outcomes = HashMap::new();
    while let Some(result) = rx.recv().await {
        outcomes.insert(result.provider.clone(), result.outcome);
    }

    // Both providers report; the hanging one reports cancellation.
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes["slack"].is_ok());
    let err = outcomes["telegram"].as_ref().unwrap_err();
    assert!(err.to_string().contains("cancelled"), "got: {err}");
}
