//! Demo CLI for the notify-hub library.
//!
//! Registers the providers enabled in the configuration and exposes the
//! manager's send and broadcast operations as subcommands.

use anyhow::Result;
use clap::{Parser, Subcommand};
use notify_hub::{Manager, Message, NotifyConfig, SlackNotifier, TelegramNotifier};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "notify-hub", about = "Send notifications through configured providers")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List registered providers.
    List,
    /// Send a message to one named provider.
    Send {
        provider: String,
        text: String,
        /// Optional title rendered above the body.
        #[arg(long)]
        title: Option<String>,
    },
    /// Send a message to every provider, one at a time.
    Broadcast { text: String },
    /// Send a message to every provider concurrently.
    BroadcastAsync { text: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = NotifyConfig::load(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    let manager = Manager::new();
    if let Some(telegram) = config.telegram.clone() {
        manager
            .register(Arc::new(TelegramNotifier::new(telegram)?))
            .await?;
    }
    if let Some(slack) = config.slack.clone() {
        manager.register(Arc::new(SlackNotifier::new(slack)?)).await?;
    }
    info!(providers = ?manager.list().await, "registered notifiers");

    let ctx = CancellationToken::new();
    match cli.command {
        Command::List => {
            for name in manager.list().await {
                println!("{name}");
            }
        }
        Command::Send {
            provider,
            text,
            title,
        } => {
            let msg = Message {
                title,
                ..Message::new(text)
            };
            manager.send_with_options(&ctx, &provider, &msg).await?;
            info!(provider = %provider, "message delivered");
        }
        Command::Broadcast { text } => {
            let errors = manager.broadcast(&ctx, &text).await;
            for err in &errors {
                error!(error = %err, "broadcast delivery failed");
            }
            if !errors.is_empty() {
                anyhow::bail!("{} deliveries failed", errors.len());
            }
            info!("broadcast delivered to all providers");
        }
        Command::BroadcastAsync { text } => {
            let mut results = manager.broadcast_async(&ctx, &text).await;
            let mut failed = 0usize;
            while let Some(result) = results.recv().await {
                match &result.outcome {
                    Ok(()) => info!(provider = %result.provider, "delivered"),
                    Err(err) => {
                        failed += 1;
                        warn!(provider = %result.provider, error = %err, "delivery failed");
                    }
                }
            }
            if failed > 0 {
                anyhow::bail!("{failed} deliveries failed");
            }
        }
    }

    Ok(())
}
