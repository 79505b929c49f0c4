//! Client configuration.
//!
//! Read from TOML:
//!
//! ```toml
//! host = "zbx.example.com"
//! port = 8080          # optional, string or number
//! tls = false
//! username = "admin"
//! password = "zabbix"
//! probe_interval_secs = 5
//! request_timeout_secs = 30
//! ```

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use zabbix_rpc_core::{Endpoint, EndpointError};

const DEFAULT_PROBE_INTERVAL_SECS: u64 = 5;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// A port as written in the config: `8080` or `"8080"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PortSetting {
    Number(u16),
    Text(String),
}

/// Connection and session settings.
#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub host: String,
    #[serde(default)]
    pub port: Option<PortSetting>,
    #[serde(default, alias = "ssl")]
    pub tls: bool,
    pub username: String,
    pub password: String,
    /// Seconds between availability probes.
    #[serde(default = "default_probe_interval")]
    pub probe_interval_secs: u64,
    /// Upper bound on every HTTP request, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_probe_interval() -> u64 {
    DEFAULT_PROBE_INTERVAL_SECS
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl ClientConfig {
    /// Settings with default timings. An empty `port` means none.
    pub fn new(
        host: impl Into<String>,
        port: impl Into<String>,
        tls: bool,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: Some(PortSetting::Text(port.into())),
            tls,
            username: username.into(),
            password: password.into(),
            probe_interval_secs: DEFAULT_PROBE_INTERVAL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check the settings can produce a working client.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.endpoint()?;
        if self.probe_interval_secs == 0 {
            return Err(ConfigError::ZeroDuration("probe_interval_secs"));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ZeroDuration("request_timeout_secs"));
        }
        Ok(())
    }

    pub fn endpoint(&self) -> Result<Endpoint, ConfigError> {
        let endpoint = match &self.port {
            None => Endpoint::new(self.host.as_str(), None, self.tls)?,
            Some(PortSetting::Number(port)) => Endpoint::new(self.host.as_str(), Some(*port), self.tls)?,
            Some(PortSetting::Text(port)) => Endpoint::with_port_str(self.host.as_str(), port, self.tls)?,
        };
        Ok(endpoint)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("tls", &self.tls)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("probe_interval_secs", &self.probe_interval_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// Error loading or validating a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Endpoint(#[from] EndpointError),

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal() {
        let config = ClientConfig::from_toml_str(
            r#"
            host = "zbx.example.com"
            username = "admin"
            password = "zabbix"
            "#,
        )
        .unwrap();
        assert_eq!(config.port, None);
        assert!(!config.tls);
        assert_eq!(config.probe_interval(), Duration::from_secs(5));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(
            config.endpoint().unwrap().url(),
            "http://zbx.example.com/zabbix/api_jsonrpc.php"
        );
    }

    #[test]
    fn port_as_number_or_string() {
        let numeric = ClientConfig::from_toml_str(
            "host = \"h\"\nport = 8080\nssl = true\nusername = \"u\"\npassword = \"p\"",
        )
        .unwrap();
        assert_eq!(numeric.endpoint().unwrap().url(), "https://h:8080/zabbix/api_jsonrpc.php");

        let text = ClientConfig::from_toml_str(
            "host = \"h\"\nport = \"\"\nusername = \"u\"\npassword = \"p\"",
        )
        .unwrap();
        assert_eq!(text.endpoint().unwrap().url(), "http://h/zabbix/api_jsonrpc.php");
    }

    #[test]
    fn rejects_bad_values() {
        let err = ClientConfig::from_toml_str(
            "host = \"h\"\nport = \"x\"\nusername = \"u\"\npassword = \"p\"",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Endpoint(EndpointError::InvalidPort(_))));

        let err = ClientConfig::from_toml_str(
            "host = \"h\"\nusername = \"u\"\npassword = \"p\"\nprobe_interval_secs = 0",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ZeroDuration("probe_interval_secs")));

        let err = ClientConfig::from_toml_str("host = \"h\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn debug_hides_password() {
        let config = ClientConfig::new("h", "", false, "admin", "hunter2");
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("admin"));
    }
}
