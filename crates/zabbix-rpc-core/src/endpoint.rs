//! Location of a Zabbix API.
//!
//! The API always lives at a fixed path below the web root:
//! `scheme://host[:port]/zabbix/api_jsonrpc.php`.

use std::fmt;

/// Path of the JSON-RPC entry point on the Zabbix frontend.
pub const API_PATH: &str = "/zabbix/api_jsonrpc.php";

/// Host, optional port and scheme of a Zabbix frontend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: String,
    port: Option<u16>,
    tls: bool,
}

impl Endpoint {
    /// Create a new endpoint.
    pub fn new(host: impl Into<String>, port: Option<u16>, tls: bool) -> Result<Self, EndpointError> {
        let host = host.into();
        if host.trim().is_empty() {
            return Err(EndpointError::EmptyHost);
        }
        Ok(Self { host, port, tls })
    }

    /// Create an endpoint from a textual port, where an empty string means
    /// "no port".
    pub fn with_port_str(
        host: impl Into<String>,
        port: &str,
        tls: bool,
    ) -> Result<Self, EndpointError> {
        Self::new(host, parse_port(port)?, tls)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn uses_tls(&self) -> bool {
        self.tls
    }

    /// `https` when TLS is enabled, `http` otherwise.
    pub fn scheme(&self) -> &'static str {
        if self.tls { "https" } else { "http" }
    }

    /// The full URL of the JSON-RPC entry point.
    pub fn url(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}://{}:{}{}", self.scheme(), self.host, port, API_PATH),
            None => write!(f, "{}://{}{}", self.scheme(), self.host, API_PATH),
        }
    }
}

/// Parse a port given as text. Blank input means no port.
fn parse_port(port: &str) -> Result<Option<u16>, EndpointError> {
    let port = port.trim();
    if port.is_empty() {
        return Ok(None);
    }
    port.parse()
        .map(Some)
        .map_err(|_| EndpointError::InvalidPort(port.to_string()))
}

/// Error building an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EndpointError {
    #[error("endpoint host cannot be empty")]
    EmptyHost,
    #[error("invalid port: {0}")]
    InvalidPort(String),
}
