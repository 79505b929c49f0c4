//! One JSON-RPC exchange: encode, POST, decode.

use crate::error::ClientError;
use crate::transport::{HttpMethod, Transport};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};
use zabbix_rpc_core::{decode, encode, DecodeError, Response, CONTENT_TYPE};

/// RPC method used to probe availability. Needs no session.
pub const PROBE_METHOD: &str = "apiinfo.version";

/// A transport bound to the API URL.
#[derive(Clone)]
pub struct Rpc {
    transport: Arc<dyn Transport>,
    url: String,
}

impl Rpc {
    pub fn new(transport: Arc<dyn Transport>, url: impl Into<String>) -> Self {
        Self {
            transport,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send `method` with `params` and decode whatever comes back.
    ///
    /// Server-side errors are returned inside the [`Response`]; only
    /// transport and decode failures are errors here.
    pub async fn send(
        &self,
        params: &Value,
        method: &str,
        token: Option<&str>,
    ) -> Result<Response, ClientError> {
        let body = encode(params, method, token);
        debug!(method, authenticated = token.is_some(), "sending request");

        let reply = self
            .transport
            .send(HttpMethod::Post, &self.url, &body, CONTENT_TYPE)
            .await?;
        if !reply.is_success() {
            warn!(method, status = reply.status, "unexpected HTTP status from Zabbix server");
        }
        Ok(decode(&reply.body)?)
    }

    /// Ask the server for its API version.
    ///
    /// Succeeds only if the answer carries a version string.
    pub async fn probe(&self) -> Result<String, ClientError> {
        let response = self.send(&json!({}), PROBE_METHOD, None).await?;
        match response.into_result() {
            Err(error) => Err(ClientError::Application(error)),
            Ok(Some(Value::String(version))) => Ok(version),
            Ok(_) => Err(DecodeError::MissingField("result").into()),
        }
    }
}

impl std::fmt::Debug for Rpc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rpc").field("url", &self.url).finish_non_exhaustive()
    }
}
