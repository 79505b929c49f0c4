//! HTTP transport.
//!
//! The client only needs "send this body, give me the status and body back".
//! [`Transport`] is that seam; [`HttpTransport`] is the `reqwest` implementation.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

/// HTTP verbs the transport supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
}

/// Status and body text of an HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one HTTP request and returns the reply.
///
/// Non-2xx statuses are replies, not errors. Only failures to complete the
/// exchange are reported as [`TransportError`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        method: HttpMethod,
        url: &str,
        body: &str,
        content_type: &str,
    ) -> Result<HttpResponse, TransportError>;
}

/// Error completing an HTTP exchange.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

/// Header the monitoring server's frontend honours for connection reuse.
const KEEP_ALIVE_HEADER: &str = "KeepAliveTimeout";
const KEEP_ALIVE_MILLIS: &str = "5000";

/// [`Transport`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport whose every request gives up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        method: HttpMethod,
        url: &str,
        body: &str,
        content_type: &str,
    ) -> Result<HttpResponse, TransportError> {
        let request = match method {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Post => self.client.post(url),
            HttpMethod::Put => self.client.put(url),
        };
        let request = match method {
            HttpMethod::Get => request,
            HttpMethod::Post | HttpMethod::Put => request
                .header(CONTENT_TYPE, content_type)
                .header(KEEP_ALIVE_HEADER, KEEP_ALIVE_MILLIS)
                .body(body.to_owned()),
        };

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}
