//! Availability watcher.
//!
//! A background task probes the server on a fixed period. The availability
//! flag it maintains gates every call; on a down-to-up transition it logs in.

use crate::client::Shared;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};
use zabbix_rpc_core::Availability;

/// Shortest period the watcher accepts. `tokio::time::interval` rejects zero.
const MIN_PERIOD: Duration = Duration::from_millis(10);

/// What a single probe did to the availability state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Probe failed, server was already down.
    StillDown,
    /// Probe failed, server was up.
    WentDown,
    /// Probe succeeded after being down, and login succeeded.
    CameUp,
    /// Probe succeeded, server was already up. No login.
    StillUp,
    /// Probe succeeded after being down, but login failed.
    LoginFailed,
}

impl Transition {
    /// State after the transition.
    pub fn availability(self) -> Availability {
        match self {
            Self::CameUp | Self::StillUp => Availability::Up,
            Self::StillDown | Self::WentDown | Self::LoginFailed => Availability::Down,
        }
    }
}

/// Probe once and update the shared state.
///
/// Ticks are serialized, so a tick run by hand while the watcher is active
/// sees the state the other one left and never logs in a second time.
pub(crate) async fn tick(shared: &Shared) -> Transition {
    let _serial = shared.ticking.lock().await;
    let was_up = shared.is_available();
    if !was_up {
        info!(url = shared.rpc.url(), "trying to connect to Zabbix server");
    }

    let version = match shared.rpc.probe().await {
        Ok(version) => version,
        Err(e) => {
            error!(url = shared.rpc.url(), "Zabbix server not reachable");
            debug!(error = %e, "availability probe failed");
            shared.set_available(false);
            return if was_up {
                info!("Zabbix server went down");
                Transition::WentDown
            } else {
                Transition::StillDown
            };
        }
    };

    if was_up {
        return Transition::StillUp;
    }

    // Callers admitted by the raised flag queue on the session lock until
    // the login below has finished.
    let mut session = shared.session.lock().await;
    shared.set_available(true);
    info!(%version, url = shared.rpc.url(), "connected to Zabbix server");
    debug!("trying authentication");

    match shared.session.login_locked(&mut session, &shared.rpc).await {
        Ok(()) => Transition::CameUp,
        Err(e) => {
            error!(error = %e, "authentication after reconnect failed");
            shared.set_available(false);
            Transition::LoginFailed
        }
    }
}

/// Handle to the running watcher task.
///
/// Dropping the handle aborts the task.
#[derive(Debug)]
pub struct WatcherHandle {
    task: Option<JoinHandle<()>>,
}

impl WatcherHandle {
    /// Start probing every `period`, first probe immediately.
    ///
    /// Must be called from within a Tokio runtime.
    pub(crate) fn spawn(shared: Arc<Shared>, period: Duration) -> Self {
        let period = period.max(MIN_PERIOD);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let transition = tick(&shared).await;
                debug!(?transition, "availability probe finished");
            }
        });
        Self { task: Some(task) }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop the task and wait for it to wind down.
    pub async fn shutdown(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            // A cancelled join error is the expected outcome.
            let _ = task.await;
        }
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
