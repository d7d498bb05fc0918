//! Error types for MSMP client operations

use msmp_core::RpcError;
use std::time::Duration;
use thiserror::Error;

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The server answered the call with an error object
    #[error(transparent)]
    Rpc(#[from] RpcError),

    /// The connection carrying the call went away
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    #[error("Client is closed")]
    Closed,

    #[error("Call timed out after {0:?}")]
    Timeout(Duration),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connect timed out after {0:?}")]
    ConnectTimeout(Duration),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("Transport closed")]
    Closed,
}

impl ClientError {
    /// The server-side error, if the call reached the server and failed there
    pub fn rpc(&self) -> Option<&RpcError> {
        match self {
            Self::Rpc(error) => Some(error),
            _ => None,
        }
    }

    /// Whether the failure came from the connection rather than the call itself
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::ConnectionLost(_) | Self::Closed
        )
    }
}

impl From<msmp_core::Error> for ClientError {
    fn from(error: msmp_core::Error) -> Self {
        match error {
            msmp_core::Error::Json(e) => Self::Json(e),
            other => Self::Config(other.to_string()),
        }
    }
}
