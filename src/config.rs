//! Configuration loading for the demo binary and embedding applications.
//!
//! Settings come from an optional TOML file merged with `NOTIFY_`-prefixed
//! environment variables (nested keys separated by `__`), with the
//! environment taking precedence.

use crate::slack::SlackConfig;
use crate::telegram::TelegramConfig;
use anyhow::{Context, Result};
use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Logging filter, e.g. `info` or `notify_hub=debug`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Telegram provider settings; absent leaves the provider disabled.
    #[serde(default)]
    pub telegram: Option<TelegramConfig>,
    /// Slack provider settings; absent leaves the provider disabled.
    #[serde(default)]
    pub slack: Option<SlackConfig>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl NotifyConfig {
    /// Loads configuration from an optional TOML file merged with
    /// `NOTIFY_`-prefixed environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment
            .merge(Env::prefixed("NOTIFY_").split("__"))
            .extract()
            .context("failed to load configuration")
    }
}
