//! Session token ownership and the login exchange.

use crate::error::ClientError;
use crate::rpc::Rpc;
use serde_json::{json, Value};
use std::fmt;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

/// RPC method that exchanges credentials for a session token.
pub const LOGIN_METHOD: &str = "user.login";

/// Username and password presented by [`LOGIN_METHOD`].
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    fn login_params(&self) -> Value {
        json!({ "user": self.username, "password": self.password })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The credentials in use and the token currently held, if any.
///
/// The token is only set by a successful login and cleared before every
/// login attempt.
#[derive(Debug)]
pub struct Session {
    credentials: Credentials,
    token: Option<String>,
}

impl Session {
    fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            token: None,
        }
    }

    pub fn username(&self) -> &str {
        self.credentials.username()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Forget the token. The next request goes out without `auth`.
    pub fn invalidate(&mut self) {
        self.token = None;
    }

    /// Swap in new credentials. The old token belongs to the old user and
    /// is dropped with them.
    pub(crate) fn replace_credentials(&mut self, credentials: Credentials) {
        self.credentials = credentials;
        self.token = None;
    }
}

/// Owns the [`Session`] behind the lock every token-dependent request
/// sequence runs under.
#[derive(Debug)]
pub struct SessionManager {
    session: Mutex<Session>,
}

impl SessionManager {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            session: Mutex::new(Session::new(credentials)),
        }
    }

    /// Take the session lock. Held for the whole of a call, including any
    /// re-authentication and retry.
    pub(crate) async fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().await
    }

    pub async fn current_token(&self) -> Option<String> {
        self.lock().await.token.clone()
    }

    pub async fn invalidate(&self) {
        self.lock().await.invalidate();
    }

    /// Run the login exchange on an already locked session.
    ///
    /// The held token is dropped first so a failed login never leaves a
    /// stale one behind. The request bypasses the auth-failure retry.
    pub(crate) async fn login_locked(
        &self,
        session: &mut Session,
        rpc: &Rpc,
    ) -> Result<(), ClientError> {
        session.invalidate();

        let response = rpc
            .send(&session.credentials.login_params(), LOGIN_METHOD, None)
            .await?;
        let token = match response.into_result() {
            Err(error) => return Err(ClientError::Auth(error.to_string())),
            Ok(None) => return Err(ClientError::Auth("login response has no result".into())),
            Ok(Some(Value::String(token))) if !token.is_empty() => token,
            Ok(Some(_)) => {
                return Err(ClientError::Auth("login result is not a token".into()));
            }
        };

        debug!(
            url = rpc.url(),
            user = session.username(),
            token = %redact(&token),
            "authenticated to Zabbix server"
        );
        session.token = Some(token);
        Ok(())
    }
}

/// Keep just enough of a token to correlate log lines.
pub(crate) fn redact(token: &str) -> String {
    match token.get(..4) {
        Some(prefix) if token.len() > 8 => format!("{prefix}..."),
        _ => "...".to_string(),
    }
}
