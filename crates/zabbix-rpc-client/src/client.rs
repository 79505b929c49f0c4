//! The public client: availability-gated calls with one re-authentication
//! retry.

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::rpc::Rpc;
use crate::session::{Credentials, SessionManager};
use crate::transport::{HttpTransport, Transport};
use crate::watcher::{self, Transition, WatcherHandle};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};
use zabbix_rpc_core::{Availability, Response};

/// State shared between the client and its watcher task.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) rpc: Rpc,
    pub(crate) session: SessionManager,
    /// Written only by availability ticks, which hold `ticking`.
    available: AtomicBool,
    pub(crate) ticking: tokio::sync::Mutex<()>,
}

impl Shared {
    fn new(rpc: Rpc, credentials: Credentials) -> Self {
        Self {
            rpc,
            session: SessionManager::new(credentials),
            available: AtomicBool::new(false),
            ticking: tokio::sync::Mutex::new(()),
        }
    }

    pub(crate) fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }

    pub(crate) fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Release);
    }

    #[cfg(test)]
    pub(crate) fn for_tests(transport: Arc<dyn Transport>) -> Self {
        Self::new(
            Rpc::new(transport, "http://zbx.example.com/zabbix/api_jsonrpc.php"),
            Credentials::new("admin", "zabbix"),
        )
    }
}

/// Client for a Zabbix JSON-RPC API.
///
/// Nothing is sent until the server has been seen by a probe: start the
/// background watcher with [`authenticate`](Self::authenticate), or probe
/// once with [`probe_now`](Self::probe_now).
#[derive(Debug)]
pub struct ZabbixClient {
    shared: Arc<Shared>,
    probe_interval: Duration,
    watcher: Mutex<Option<WatcherHandle>>,
}

impl ZabbixClient {
    /// Create a client that talks HTTP(S) through `reqwest`.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let transport = HttpTransport::new(config.request_timeout())?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client over any [`Transport`].
    pub fn with_transport(
        config: &ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ClientError> {
        config.validate()?;
        let endpoint = config.endpoint()?;
        let rpc = Rpc::new(transport, endpoint.url());
        let credentials = Credentials::new(config.username.as_str(), config.password.as_str());
        Ok(Self {
            shared: Arc::new(Shared::new(rpc, credentials)),
            probe_interval: config.probe_interval(),
            watcher: Mutex::new(None),
        })
    }

    /// URL of the JSON-RPC entry point.
    pub fn base_url(&self) -> &str {
        self.shared.rpc.url()
    }

    pub fn availability(&self) -> Availability {
        Availability::from_flag(self.shared.is_available())
    }

    pub fn is_available(&self) -> bool {
        self.shared.is_available()
    }

    /// Start the availability watcher. Calling it again while the watcher
    /// runs does nothing.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn authenticate(&self) {
        let mut watcher = self.watcher.lock().unwrap_or_else(PoisonError::into_inner);
        if watcher.as_ref().is_some_and(WatcherHandle::is_running) {
            return;
        }
        debug!(url = self.base_url(), period = ?self.probe_interval, "starting availability watcher");
        *watcher = Some(WatcherHandle::spawn(self.shared.clone(), self.probe_interval));
    }

    /// Run a single availability probe now, outside the watcher's schedule.
    ///
    /// Safe to use while the watcher runs: ticks take turns, so the server
    /// coming up still produces exactly one login.
    pub async fn probe_now(&self) -> Transition {
        watcher::tick(&self.shared).await
    }

    /// Stop the availability watcher. In-flight calls finish on their own.
    pub async fn destroy(&self) {
        let handle = self
            .watcher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            debug!(url = self.base_url(), "stopping availability watcher");
            handle.shutdown().await;
        }
    }

    /// Log in now, replacing any held token.
    pub async fn login(&self) -> Result<(), ClientError> {
        if !self.shared.is_available() {
            return Err(ClientError::Unavailable);
        }
        let mut session = self.shared.session.lock().await;
        self.shared
            .session
            .login_locked(&mut session, &self.shared.rpc)
            .await
    }

    /// Switch to another Zabbix user and log in with it.
    ///
    /// The new credentials replace the old ones even while the server is
    /// down, in which case this fails with [`ClientError::Unavailable`] and
    /// the watcher logs in with them once the server is back.
    pub async fn login_as(
        &self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<(), ClientError> {
        let mut session = self.shared.session.lock().await;
        session.replace_credentials(Credentials::new(username, password));
        debug!(url = self.base_url(), user = session.username(), "credentials replaced");
        if !self.shared.is_available() {
            return Err(ClientError::Unavailable);
        }
        self.shared
            .session
            .login_locked(&mut session, &self.shared.rpc)
            .await
    }

    /// Forget the held token without telling the server.
    pub async fn invalidate(&self) {
        self.shared.session.invalidate().await;
    }

    pub async fn current_token(&self) -> Option<String> {
        self.shared.session.current_token().await
    }

    pub async fn is_authenticated(&self) -> bool {
        self.shared.session.lock().await.is_authenticated()
    }

    /// Call `method` with `params`.
    ///
    /// Fails fast with [`ClientError::Unavailable`] while the server is
    /// considered down. If the server rejects the session, the token is
    /// dropped, a fresh login is made and the request is sent once more.
    /// A failed re-login or a second rejection is reported as
    /// [`ClientError::Auth`].
    pub async fn call(&self, params: &Value, method: &str) -> Result<Response, ClientError> {
        if !self.shared.is_available() {
            return Err(ClientError::Unavailable);
        }
        let shared = &*self.shared;

        let mut session = shared.session.lock().await;
        // A login by the watcher may have failed while this call waited.
        if !shared.is_available() {
            return Err(ClientError::Unavailable);
        }
        let mut response = shared.rpc.send(params, method, session.token()).await?;
        if response.is_auth_failure() {
            warn!(method, "session rejected by Zabbix server, authenticating again");
            session.invalidate();
            shared
                .session
                .login_locked(&mut session, &shared.rpc)
                .await
                .map_err(|e| match e {
                    ClientError::Auth(_) => e,
                    other => ClientError::Auth(format!("re-authentication failed: {other}")),
                })?;
            response = shared.rpc.send(params, method, session.token()).await?;
            if response.is_auth_failure() {
                return Err(ClientError::Auth(format!(
                    "server rejected the refreshed session for {method}"
                )));
            }
        }
        drop(session);

        match response.error {
            Some(error) => Err(ClientError::Application(error)),
            None => Ok(response),
        }
    }
}
