//! Engine error types.

use std::io;

use sheetbridge_core::ProviderKind;
use sheetbridge_providers::ProviderError;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by token and record stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Stored data could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A partial update targeted a credential that doesn't exist.
    #[error("no {provider} credential stored for user '{user_id}'")]
    NotFound {
        user_id: String,
        provider: ProviderKind,
    },

    /// The backing service could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn not_found(user_id: impl Into<String>, provider: ProviderKind) -> Self {
        Self::NotFound {
            user_id: user_id.into(),
            provider,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Failures surfaced to callers of the credential manager and reconciler.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No usable credential: never connected, or expired with no way to refresh.
    #[error("not connected to {provider}: {reason}")]
    NotConnected {
        provider: ProviderKind,
        reason: String,
    },

    /// The provider rejected the refresh, or could not be reached.
    #[error("refreshing the {provider} token failed: {source}")]
    RefreshFailed {
        provider: ProviderKind,
        #[source]
        source: ProviderError,
    },

    /// A new token was minted but could not be saved.
    #[error("refreshed {provider} token could not be saved: {source}")]
    PersistenceFailed {
        provider: ProviderKind,
        #[source]
        source: StoreError,
    },

    /// Malformed reconciliation request.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The token store could not be read.
    #[error("token store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),

    /// Invalid engine configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl EngineError {
    pub fn not_connected(provider: ProviderKind, reason: impl Into<String>) -> Self {
        Self::NotConnected {
            provider,
            reason: reason.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Stable identifier for logs and API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotConnected { .. } => "not_connected",
            Self::RefreshFailed { .. } => "refresh_failed",
            Self::PersistenceFailed { .. } => "persistence_failed",
            Self::InvalidInput(_) => "invalid_input",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::Config(_) => "configuration_error",
        }
    }

    /// The provider involved, for credential errors.
    pub fn provider(&self) -> Option<ProviderKind> {
        match self {
            Self::NotConnected { provider, .. }
            | Self::RefreshFailed { provider, .. }
            | Self::PersistenceFailed { provider, .. } => Some(*provider),
            _ => None,
        }
    }

    /// True when the user has to reconnect the provider to recover.
    ///
    /// A refresh that failed for a transient reason (network, 5xx, rate
    /// limit) is not a reconnect case; the caller may simply try again later.
    pub fn requires_reconnect(&self) -> bool {
        match self {
            Self::NotConnected { .. } => true,
            Self::RefreshFailed { source, .. } => !source.is_retryable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes() {
        assert_eq!(
            EngineError::not_connected(ProviderKind::Google, "x").code(),
            "not_connected"
        );
        assert_eq!(EngineError::invalid_input("x").code(), "invalid_input");
        assert_eq!(
            EngineError::StoreUnavailable(StoreError::unavailable("down")).code(),
            "store_unavailable"
        );
    }

    #[test]
    fn reconnect_classification() {
        assert!(EngineError::not_connected(ProviderKind::HubSpot, "gone").requires_reconnect());

        let revoked = EngineError::RefreshFailed {
            provider: ProviderKind::Google,
            source: ProviderError::authentication("invalid_grant"),
        };
        assert!(revoked.requires_reconnect());

        let flaky = EngineError::RefreshFailed {
            provider: ProviderKind::Google,
            source: ProviderError::network("timeout"),
        };
        assert!(!flaky.requires_reconnect());

        let persist = EngineError::PersistenceFailed {
            provider: ProviderKind::Google,
            source: StoreError::unavailable("db down"),
        };
        assert!(!persist.requires_reconnect());
        assert_eq!(persist.provider(), Some(ProviderKind::Google));
    }

    #[test]
    fn display_and_source() {
        use std::error::Error;

        let err = EngineError::PersistenceFailed {
            provider: ProviderKind::HubSpot,
            source: StoreError::not_found("u1", ProviderKind::HubSpot),
        };
        let text = err.to_string();
        assert!(text.contains("hubspot"));
        assert!(text.contains("u1"));
        assert!(err.source().is_some());
    }
}
