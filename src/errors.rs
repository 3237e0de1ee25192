//! Error taxonomy for registry, lookup, and provider failures.

use thiserror::Error;

/// Boxed source error attached to a provider failure.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced by the dispatch layer and its providers.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Registration was attempted with a provider whose name is empty.
    #[error("provider name must not be empty")]
    InvalidProvider,

    /// Registration was attempted under an identity that is already taken.
    #[error("provider `{0}` is already registered")]
    DuplicateProvider(String),

    /// A targeted send referenced an identity that is not registered.
    #[error("provider `{0}` not found")]
    ProviderNotFound(String),

    /// An opaque failure surfaced by a provider's own send call.
    ///
    /// The dispatch layer tags the failure with the originating provider's
    /// identity but never inspects or classifies its cause.
    #[error("{provider} notification error: {message}")]
    Provider {
        provider: String,
        message: String,
        #[source]
        source: Option<BoxedError>,
    },
}

impl NotifyError {
    /// Creates a provider failure without an underlying cause.
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        NotifyError::Provider {
            provider: provider.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a provider failure wrapping an underlying cause.
    pub fn provider_with_source(
        provider: impl Into<String>,
        message: impl Into<String>,
        source: impl Into<BoxedError>,
    ) -> Self {
        NotifyError::Provider {
            provider: provider.into(),
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Identity of the provider this error refers to, when one is known.
    pub fn provider_name(&self) -> Option<&str> {
        match self {
            NotifyError::InvalidProvider => None,
            NotifyError::DuplicateProvider(name)
            | NotifyError::ProviderNotFound(name)
            | NotifyError::Provider { provider: name, .. } => Some(name),
        }
    }
}
