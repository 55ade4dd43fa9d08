//! Client error types.

use std::fmt;

use sheetbridge_engine::{EngineError, StoreError};

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug)]
pub enum ClientError {
    /// Configuration error.
    Config(String),
    /// Bad command-line input or input file.
    Input(String),
    /// Credential manager or reconciler failure.
    Engine(EngineError),
    /// Token store failure outside the engine.
    Store(StoreError),
    /// IO error.
    Io(std::io::Error),
}

impl ClientError {
    /// A follow-up hint for the user, if there is an obvious next step.
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::Engine(err) if err.requires_reconnect() => {
                let provider = err.provider()?;
                Some(format!(
                    "please reconnect {}: sheetbridge connect --provider {} ...",
                    provider.display_name(),
                    provider
                ))
            }
            Self::Engine(EngineError::RefreshFailed { .. }) => {
                Some("the provider could not be reached; try again later".to_string())
            }
            _ => None,
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Input(msg) => write!(f, "invalid input: {}", msg),
            Self::Engine(err) => write!(f, "{}", err),
            Self::Store(err) => write!(f, "token store error: {}", err),
            Self::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Engine(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<EngineError> for ClientError {
    fn from(err: EngineError) -> Self {
        Self::Engine(err)
    }
}

impl From<StoreError> for ClientError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}
