use std::{sync::Arc, time::Duration};

use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::{UserProfile, WalletApi};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionStatus {
    Pending,
    Active(UserProfile),
    Unreachable(String),
    Expired,
}

/// Periodically re-validates the bearer token. Stops on expiry, on `logout`,
/// or when dropped.
pub struct SessionWatcher {
    cancel: CancellationToken,
    status: watch::Receiver<SessionStatus>,
    task: Option<JoinHandle<()>>,
}

impl SessionWatcher {
    pub fn spawn(api: Arc<dyn WalletApi>, every: Duration) -> Self {
        let (tx, rx) = watch::channel(SessionStatus::Pending);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(poll(api, every, tx, cancel.clone()));

        SessionWatcher {
            cancel,
            status: rx,
            task: Some(task),
        }
    }

    pub fn status(&self) -> watch::Receiver<SessionStatus> {
        self.status.clone()
    }

    pub async fn logout(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        debug!("Session watcher stopped");
    }
}

impl Drop for SessionWatcher {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn poll(
    api: Arc<dyn WalletApi>,
    every: Duration,
    tx: watch::Sender<SessionStatus>,
    cancel: CancellationToken,
) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let status = match api.current_user().await {
            Ok(user) => SessionStatus::Active(user),
            Err(e) if e.is_auth_failure() => SessionStatus::Expired,
            Err(e) => {
                warn!("Session check failed: {}", e);
                SessionStatus::Unreachable(e.user_message())
            }
        };

        let expired = status == SessionStatus::Expired;
        tx.send_replace(status);
        if expired {
            warn!("Session expired");
            break;
        }
    }
}
