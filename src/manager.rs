//! The notification manager: a name-keyed provider registry plus targeted
//! send, sequential broadcast, and concurrent broadcast with per-provider
//! result aggregation.
//!
//! The registry lock is held only for map reads and writes, never across a
//! provider call, so a slow provider can never starve registry operations
//! or other in-flight sends.

use crate::errors::NotifyError;
use crate::message::Message;
use crate::notifier::{DispatchResult, Notifier};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Registry and dispatch orchestrator over a dynamic set of providers.
#[derive(Default)]
pub struct Manager {
    notifiers: RwLock<HashMap<String, Arc<dyn Notifier>>>,
}

impl Manager {
    /// Creates a manager with an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a provider under its own name.
    ///
    /// Fails with [`NotifyError::InvalidProvider`] if the name is empty and
    /// with [`NotifyError::DuplicateProvider`] if the name is already taken;
    /// in both cases the registry is left untouched.
    pub async fn register(&self, notifier: Arc<dyn Notifier>) -> Result<(), NotifyError> {
        let name = notifier.name().to_string();
        if name.is_empty() {
            return Err(NotifyError::InvalidProvider);
        }

        let mut notifiers = self.notifiers.write().await;
        if notifiers.contains_key(&name) {
            return Err(NotifyError::DuplicateProvider(name));
        }

        debug!(provider = %name, "registered notifier");
        notifiers.insert(name, notifier);
        Ok(())
    }

    /// Removes a provider by name. Removing an absent name is a no-op.
    pub async fn unregister(&self, name: &str) {
        if self.notifiers.write().await.remove(name).is_some() {
            debug!(provider = %name, "unregistered notifier");
        }
    }

    /// Looks up a provider by name. Never blocks on in-flight sends.
    pub async fn get(&self, name: &str) -> Option<Arc<dyn Notifier>> {
        self.notifiers.read().await.get(name).cloned()
    }

    /// Returns the names of all registered providers, in no particular order.
    pub async fn list(&self) -> Vec<String> {
        self.notifiers.read().await.keys().cloned().collect()
    }

    /// Sends a plain-text message to one named provider, returning the
    /// provider's result verbatim.
    pub async fn send(
        &self,
        ctx: &CancellationToken,
        provider: &str,
        text: &str,
    ) -> Result<(), NotifyError> {
        let notifier = self
            .get(provider)
            .await
            .ok_or_else(|| NotifyError::ProviderNotFound(provider.to_string()))?;
        notifier.send(ctx, text).await
    }

    /// Sends a message with options to one named provider.
    pub async fn send_with_options(
        &self,
        ctx: &CancellationToken,
        provider: &str,
        msg: &Message,
    ) -> Result<(), NotifyError> {
        let notifier = self
            .get(provider)
            .await
            .ok_or_else(|| NotifyError::ProviderNotFound(provider.to_string()))?;
        notifier.send_with_options(ctx, msg).await
    }

    /// Sends a plain-text message to every registered provider, one at a
    /// time.
    ///
    /// Every provider in the snapshot receives exactly one delivery attempt
    /// regardless of earlier failures. The returned vector holds one error
    /// per failed provider; empty means full success.
    pub async fn broadcast(&self, ctx: &CancellationToken, text: &str) -> Vec<NotifyError> {
        let snapshot = self.snapshot().await;
        let mut errors = Vec::new();
        for (name, notifier) in snapshot {
            if let Err(err) = notifier.send(ctx, text).await {
                warn!(provider = %name, error = %err, "broadcast delivery failed");
                errors.push(tag(&name, err));
            }
        }
        errors
    }

    /// Sends a message with options to every registered provider, one at a
    /// time. Same failure-collection contract as [`Manager::broadcast`].
    pub async fn broadcast_with_options(
        &self,
        ctx: &CancellationToken,
        msg: &Message,
    ) -> Vec<NotifyError> {
        let snapshot = self.snapshot().await;
        let mut errors = Vec::new();
        for (name, notifier) in snapshot {
            if let Err(err) = notifier.send_with_options(ctx, msg).await {
                warn!(provider = %name, error = %err, "broadcast delivery failed");
                errors.push(tag(&name, err));
            }
        }
        errors
    }

    /// Sends a plain-text message to every registered provider concurrently.
    ///
    /// The registry snapshot is taken under the read lock, so register and
    /// unregister calls issued afterwards cannot affect the in-flight
    /// broadcast. One task is spawned per snapshotted provider and each
    /// produces exactly one [`DispatchResult`]; the returned receiver yields
    /// results in completion order and closes once all of them have
    /// reported. Cancelling `ctx` mid-broadcast surfaces as per-provider
    /// failures, never as an early close.
    pub async fn broadcast_async(
        &self,
        ctx: &CancellationToken,
        text: &str,
    ) -> mpsc::Receiver<DispatchResult> {
        let snapshot = self.snapshot().await;
        debug!(providers = snapshot.len(), "dispatching concurrent broadcast");

        // Capacity covers one result per task, so a completed send never
        // waits on a slow consumer.
        let (tx, rx) = mpsc::channel(snapshot.len().max(1));
        for (name, notifier) in snapshot {
            let tx = tx.clone();
            let ctx = ctx.clone();
            let text = text.to_string();
            tokio::spawn(async move {
                let outcome = notifier.send(&ctx, &text).await.map_err(|e| tag(&name, e));
                let _ = tx
                    .send(DispatchResult {
                        provider: name,
                        outcome,
                    })
                    .await;
            });
        }
        // The last sender clone is dropped when the final task reports,
        // which closes the stream; closure is the completion signal.
        rx
    }

    /// Sends a message with options to every registered provider
    /// concurrently. Same result-stream contract as
    /// [`Manager::broadcast_async`].
    pub async fn broadcast_async_with_options(
        &self,
        ctx: &CancellationToken,
        msg: &Message,
    ) -> mpsc::Receiver<DispatchResult> {
        let snapshot = self.snapshot().await;
        debug!(providers = snapshot.len(), "dispatching concurrent broadcast");

        let (tx, rx) = mpsc::channel(snapshot.len().max(1));
        for (name, notifier) in snapshot {
            let tx = tx.clone();
            let ctx = ctx.clone();
            let msg = msg.clone();
            tokio::spawn(async move {
                let outcome = notifier
                    .send_with_options(&ctx, &msg)
                    .await
                    .map_err(|e| tag(&name, e));
                let _ = tx
                    .send(DispatchResult {
                        provider: name,
                        outcome,
                    })
                    .await;
            });
        }
        rx
    }

    /// Copies the current registry contents under the read lock.
    async fn snapshot(&self) -> Vec<(String, Arc<dyn Notifier>)> {
        self.notifiers
            .read()
            .await
            .iter()
            .map(|(name, notifier)| (name.clone(), Arc::clone(notifier)))
            .collect()
    }
}

/// Ensures a broadcast-time error carries the identity of the provider it
/// came from. Provider errors already do; anything else gets wrapped.
fn tag(name: &str, err: NotifyError) -> NotifyError {
    match err {
        e @ NotifyError::Provider { .. } => e,
        other => NotifyError::provider_with_source(name, "delivery failed", other),
    }
}
