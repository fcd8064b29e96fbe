//! Recurring refresh trigger.

use std::time::Duration;
use tokio::{task::JoinHandle, time::MissedTickBehavior};

use super::StateEngine;

/// Fires a refresh every interval until dropped.
pub struct RefreshTimer {
    handle: JoinHandle<()>,
}

impl RefreshTimer {
    /// Start the timer; the first refresh happens one interval from now.
    pub fn spawn(engine: StateEngine, interval: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // A late tick is dropped rather than replayed in a burst.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                tracing::info!("scheduled refresh");
                // Waiting here means ticks never stack on a slow refresh.
                engine.refresh_now().await;
            }
        });
        tracing::info!("refresh timer started: every {}s", interval.as_secs());
        Self { handle }
    }
}

impl Drop for RefreshTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeStore, FakeWorklogClient, sample_credentials, sample_worklog};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_timer_refreshes_periodically_until_dropped() {
        let store = Arc::new(FakeStore::with(Ok(sample_credentials(7))));
        let client = Arc::new(FakeWorklogClient::returning(Ok(Some(sample_worklog())), Some(1)));
        let engine = StateEngine::new(store, client.clone());
        engine.check_credentials_and_refresh_now().await;
        assert_eq!(client.fetch_calls(), 1);

        let timer = RefreshTimer::spawn(engine.clone(), Duration::from_millis(20));
        tokio::time::timeout(Duration::from_secs(2), async {
            while client.fetch_calls() < 3 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        drop(timer);
        // Let an in-flight tick settle before sampling.
        tokio::time::sleep(Duration::from_millis(30)).await;
        let after_drop = client.fetch_calls();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(client.fetch_calls(), after_drop);
    }

    #[tokio::test]
    async fn test_timer_without_credentials_does_nothing() {
        let store = Arc::new(FakeStore::empty());
        let client = Arc::new(FakeWorklogClient::returning(Ok(None), None));
        let engine = StateEngine::new(store, client.clone());

        let _timer = RefreshTimer::spawn(engine.clone(), Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(client.fetch_calls(), 0);
        assert_eq!(engine.snapshot(), crate::engine::EngineState::default());
    }
}
