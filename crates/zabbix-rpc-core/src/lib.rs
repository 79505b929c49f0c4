//! Core types for talking to a Zabbix JSON-RPC API.
//!
//! This crate provides the protocol primitives: where the API lives and how
//! requests and responses are framed. Session handling and transport live in
//! `zabbix-rpc-client`.

mod endpoint;
mod envelope;

pub use endpoint::{Endpoint, EndpointError, API_PATH};
pub use envelope::{
    decode, encode, DecodeError, Request, Response, RpcError, AUTH_FAILURE_SENTINEL,
    CONTENT_TYPE, JSONRPC_VERSION, REQUEST_ID,
};

/// Reachability of the remote server as last observed by a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Availability {
    /// Last probe failed, or no probe has run yet.
    #[default]
    Down,
    /// Last probe succeeded and a login was attempted.
    Up,
}

impl Availability {
    /// Map the availability flag onto a state.
    pub fn from_flag(available: bool) -> Self {
        if available { Self::Up } else { Self::Down }
    }

    pub fn is_up(self) -> bool {
        self == Self::Up
    }
}
