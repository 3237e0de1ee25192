//! The provider capability trait and per-provider dispatch outcomes.

use crate::errors::NotifyError;
use crate::message::Message;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// A named backend capable of delivering simple or rich messages.
///
/// Implementations must be safe to invoke concurrently with different
/// cancellation tokens; the manager offers no per-provider serialization
/// across broadcast calls. The name must be stable for the lifetime of the
/// registration, as it is used verbatim as the registry key.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Stable identity of this provider.
    fn name(&self) -> &str;

    /// Delivers a plain-text message.
    async fn send(&self, ctx: &CancellationToken, text: &str) -> Result<(), NotifyError>;

    /// Delivers a message honoring the options in [`Message`].
    ///
    /// Providers may ignore fields they do not support but must not fail
    /// solely because an optional field is present.
    async fn send_with_options(
        &self,
        ctx: &CancellationToken,
        msg: &Message,
    ) -> Result<(), NotifyError>;
}

/// The outcome of one provider's delivery attempt within a concurrent
/// broadcast. Exactly one is produced per provider per broadcast call.
#[derive(Debug)]
pub struct DispatchResult {
    /// Identity of the provider that produced this result.
    pub provider: String,
    /// The provider's send outcome.
    pub outcome: Result<(), NotifyError>,
}

impl DispatchResult {
    /// Whether the delivery attempt succeeded.
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}
