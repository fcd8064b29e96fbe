//! Detects edits to the credential file and re-runs the credential check.

use std::{sync::Arc, time::Duration};
use tokio::{task::JoinHandle, time::MissedTickBehavior};

use super::FileCredentialStore;
use crate::engine::StateEngine;

/// Background poller comparing content fingerprints; stops when dropped.
pub struct CredentialWatcher {
    handle: JoinHandle<()>,
}

impl CredentialWatcher {
    pub fn spawn(store: Arc<FileCredentialStore>, engine: StateEngine, poll: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut last = store.fingerprint().await;
            let mut ticker = tokio::time::interval(poll);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let current = store.fingerprint().await;
                if current == last {
                    continue;
                }
                tracing::info!("credential file changed");
                last = current;
                engine.check_credentials_and_refresh_now().await;
            }
        });
        Self { handle }
    }
}

impl Drop for CredentialWatcher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
