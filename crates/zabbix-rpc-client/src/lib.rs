//! Self-healing session client for the Zabbix JSON-RPC API.
//!
//! The client keeps a background watcher probing the server. While the server
//! is down every call fails fast; when it comes back the watcher logs in
//! again. Calls whose session the server rejects are re-authenticated and
//! retried once.
//!
//! ```rust,no_run
//! use serde_json::json;
//! use zabbix_rpc_client::{ClientConfig, ZabbixClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::new("zbx.example.com", "", false, "admin", "zabbix");
//! let client = ZabbixClient::new(&config)?;
//! client.authenticate();
//!
//! let hosts = client.call(&json!({"output": ["hostid", "name"]}), "host.get").await?;
//! println!("{:?}", hosts.result);
//!
//! client.destroy().await;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod rpc;
mod session;
mod transport;
mod watcher;

#[cfg(test)]
mod testing;

pub use client::ZabbixClient;
pub use config::{ClientConfig, ConfigError, PortSetting};
pub use error::{ClientError, FailureKind};
pub use rpc::PROBE_METHOD;
pub use session::{Credentials, LOGIN_METHOD};
pub use transport::{HttpMethod, HttpResponse, HttpTransport, Transport, TransportError};
pub use watcher::{Transition, WatcherHandle};

pub use zabbix_rpc_core::{Availability, Response, RpcError};
