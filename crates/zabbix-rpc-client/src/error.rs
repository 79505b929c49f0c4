//! Errors surfaced by the client.

use crate::config::ConfigError;
use crate::transport::TransportError;
use zabbix_rpc_core::{DecodeError, RpcError};

/// Everything a call (or a login) can fail with.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The last availability probe failed; nothing was sent.
    #[error("Zabbix server is not reachable")]
    Unavailable,

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("could not decode the server's response: {0}")]
    Decode(#[from] DecodeError),

    /// No usable token could be obtained, or the server rejected a fresh one.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// A well-formed error reported by the server.
    #[error("server error: {0}")]
    Application(RpcError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Coarse classification of a [`ClientError`], for deciding between backing
/// off and giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The server could not be reached. Worth retrying later.
    Unreachable,
    /// The server answered but refused the request.
    RequestFailed,
    /// The server answered with something that is not a JSON-RPC envelope.
    MalformedResponse,
}

impl ClientError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Unavailable | Self::Transport(_) => FailureKind::Unreachable,
            Self::Decode(_) => FailureKind::MalformedResponse,
            Self::Auth(_) | Self::Application(_) | Self::Config(_) => FailureKind::RequestFailed,
        }
    }

    /// The server's error object, for application errors.
    pub fn rpc_error(&self) -> Option<&RpcError> {
        match self {
            Self::Application(error) => Some(error),
            _ => None,
        }
    }
}
