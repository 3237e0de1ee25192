//! End-to-end broadcast tests running real providers against mock HTTP
//! servers.

use notify_hub::{Manager, Message, SlackConfig, SlackNotifier, TelegramConfig, TelegramNotifier};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn telegram_notifier(api_base: String) -> TelegramNotifier {
    TelegramNotifier::new(TelegramConfig {
        bot_token: "TOKEN".to_string(),
        chat_id: "42".to_string(),
        parse_mode: "Markdown".to_string(),
        api_base,
    })
    .unwrap()
}

fn slack_notifier(webhook_url: String) -> SlackNotifier {
    SlackNotifier::new(SlackConfig {
        token: None,
        webhook_url: Some(webhook_url),
        default_channel: None,
        username: None,
        icon_emoji: None,
        api_base: "https://slack.com/api".to_string(),
    })
    .unwrap()
}

async fn manager_with_real_providers(server: &MockServer) -> Manager {
    let manager = Manager::new();
    manager
        .register(Arc::new(telegram_notifier(server.uri())))
        .await
        .unwrap();
    manager
        .register(Arc::new(slack_notifier(format!("{}/hook", server.uri()))))
        .await
        .unwrap();
    manager
}

#[tokio::test]
async fn broadcast_delivers_to_every_provider() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/botTOKEN/sendMessage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let manager = manager_with_real_providers(&server).await;
    let ctx = CancellationToken::new();

    let errors = manager.broadcast(&ctx, "deploy finished").await;
    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
}

#[tokio::test]
async fn failing_provider_is_collected_without_blocking_the_other() {
    let server = MockServer::start().await;
    // Telegram rejects the message, Slack accepts it.
    Mock::given(method("POST"))
        .and(path("/botTOKEN/sendMessage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": false,
            "description": "Forbidden: bot was blocked by the user",
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let manager = manager_with_real_providers(&server).await;
    let ctx = CancellationToken::new();

    let errors = manager.broadcast(&ctx, "deploy finished").await;
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].provider_name(), Some("telegram"));
}

#[tokio::test]
async fn broadcast_async_yields_one_result_per_provider() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/botTOKEN/sendMessage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let manager = manager_with_real_providers(&server).await;
    let ctx = CancellationToken::new();

    let mut rx = manager.broadcast_async(&ctx, "deploy finished").await;
    let mut outcomes = HashMap::new();
    while let Some(result) = rx.recv().await {
        outcomes.insert(result.provider.clone(), result.is_success());
    }

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes["telegram"]);
    assert!(!outcomes["slack"]);
}

#[tokio::test]
async fn rich_broadcast_reaches_both_wire_formats() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/botTOKEN/sendMessage"))
        .and(body_partial_json(json!({
            "text": "*Release*\n\nv1.2.3 is out",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(body_partial_json(json!({
            "text": "v1.2.3 is out",
            "blocks": [
                { "type": "header", "text": { "type": "plain_text", "text": "Release" } },
                { "type": "section", "text": { "type": "mrkdwn", "text": "v1.2.3 is out" } },
            ],
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let manager = manager_with_real_providers(&server).await;
    let ctx = CancellationToken::new();

    let msg = Message::new("v1.2.3 is out").with_title("Release");
    let errors = manager.broadcast_with_options(&ctx, &msg).await;
    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
}
