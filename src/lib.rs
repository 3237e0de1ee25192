//! notify-hub - multi-provider notification dispatch
//!
//! This library provides a registry of named delivery backends
//! ("providers") and a [`Manager`] that routes messages to one or all of
//! them, synchronously or concurrently, collecting per-provider outcomes
//! without ever letting one provider's failure block another's.

pub mod config;
pub mod errors;
pub mod manager;
pub mod message;
pub mod notifier;
pub mod slack;
pub mod telegram;

// Re-export the surface most callers need.
pub use config::NotifyConfig;
pub use errors::NotifyError;
pub use manager::Manager;
pub use message::{Attachment, AttachmentField, Message, Priority};
pub use notifier::{DispatchResult, Notifier};
pub use slack::{SlackConfig, SlackNotifier};
pub use telegram::{TelegramConfig, TelegramNotifier};
