//! Configuration loading against real files, wired into a manager.

use notify_hub::{Manager, NotifyConfig, SlackNotifier, TelegramNotifier};
use std::io::Write;
use std::sync::Arc;

#[tokio::test]
async fn providers_from_a_config_file_register_cleanly() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r##"
[telegram]
bot_token = "TOKEN"
chat_id = "42"

[slack]
token = "xoxb-test"
default_channel = "#alerts"
"##
    )
    .unwrap();

    let config = NotifyConfig::load(Some(file.path())).unwrap();

    let manager = Manager::new();
    if let Some(telegram) = config.telegram {
        manager
            .register(Arc::new(TelegramNotifier::new(telegram).unwrap()))
            .await
            .unwrap();
    }
    if let Some(slack) = config.slack {
        manager
            .register(Arc::new(SlackNotifier::new(slack).unwrap()))
            .await
            .unwrap();
    }

    let mut names = manager.list().await;
    names.sort();
    assert_eq!(names, vec!["slack", "telegram"]);
}

#[test]
fn invalid_provider_section_fails_at_construction() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[telegram]
bot_token = ""
chat_id = "42"
"#
    )
    .unwrap();

    let config = NotifyConfig::load(Some(file.path())).unwrap();
    let telegram = config.telegram.expect("telegram section");
    assert!(TelegramNotifier::new(telegram).is_err());
}
