//! State engine: owns the published worklog status and runs refreshes.
//!
//! All writes go through one `watch::Sender`, so commits are serialized and
//! every observer sees the same snapshot. Collaborator calls happen outside
//! that critical section; only their combined outcome is committed.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use anyhow::anyhow;
use thiserror::Error;
use tokio::{sync::watch, task::JoinHandle};

use crate::{
    credentials::{CredentialError, CredentialStore, DEFAULT_WARNING_THRESHOLD_DAYS},
    tempo::{TempoError, Worklog, WorklogClient},
};

/// Published state record.
pub mod state;
/// Healthy / warning / stale derivation.
pub mod status;
/// Recurring refresh trigger.
pub mod timer;

pub use state::EngineState;
pub use status::{DerivedStatus, StatusColor};
pub use timer::RefreshTimer;

/// Why a refresh ended in the failed state; `Display` is the user message.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("No credentials configured")]
    NoCredentials,
    #[error("Credential error: {0}")]
    Credential(String),
    #[error("Tempo error: {0}")]
    Tempo(#[from] TempoError),
    #[error("Error: {0}")]
    Other(anyhow::Error),
}

impl From<CredentialError> for RefreshError {
    fn from(e: CredentialError) -> Self {
        match e {
            CredentialError::NoStoredCredentials => Self::NoCredentials,
            CredentialError::DecodingFailed(detail) => Self::Credential(detail),
        }
    }
}

/// Result of one successful fetch, committed as a unit.
#[derive(Debug)]
struct Fetched {
    worklog: Option<Worklog>,
    days: Option<i64>,
}

/// Outcome of trying to enter the loading state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RefreshStart {
    /// No credentials; nothing happened.
    Skipped,
    /// Another refresh is loading; join it.
    Coalesced,
    /// This caller owns the new refresh.
    Started,
}

struct Inner {
    state: watch::Sender<EngineState>,
    /// Set when a credential check coalesced into a loading refresh.
    rerun: AtomicBool,
    store: Arc<dyn CredentialStore>,
    client: Arc<dyn WorklogClient>,
}

/// Cheap handle to the single engine instance.
#[derive(Clone)]
pub struct StateEngine {
    inner: Arc<Inner>,
}

impl StateEngine {
    /// Create the engine with default state and injected collaborators.
    pub fn new(store: Arc<dyn CredentialStore>, client: Arc<dyn WorklogClient>) -> Self {
        let (state, _) = watch::channel(EngineState::default());
        Self {
            inner: Arc::new(Inner {
                state,
                rerun: AtomicBool::new(false),
                store,
                client,
            }),
        }
    }

    /// Receiver notified after every state commit.
    pub fn subscribe(&self) -> watch::Receiver<EngineState> {
        self.inner.state.subscribe()
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> EngineState {
        self.inner.state.borrow().clone()
    }

    /// Fire-and-forget refresh. Must be called inside a tokio runtime.
    pub fn refresh(&self) {
        if self.begin_refresh(false) == RefreshStart::Started {
            self.spawn_refresh();
        }
    }

    /// Refresh and wait for the outcome to be committed.
    ///
    /// A caller arriving while another refresh is loading waits for that one
    /// instead of starting a second fetch. Dropping the returned future does
    /// not cancel the refresh; its outcome is still committed.
    pub async fn refresh_now(&self) {
        self.request_refresh(false).await;
    }

    /// Fire-and-forget credential check followed by a refresh.
    pub fn check_credentials_and_refresh(&self) {
        let engine = self.clone();
        tokio::spawn(async move { engine.check_credentials_and_refresh_now().await });
    }

    /// Re-read the credential store, then refresh if a record exists.
    ///
    /// If a refresh is already loading, one more fetch is queued behind it so
    /// the new credentials are always used.
    pub async fn check_credentials_and_refresh_now(&self) {
        let store = &self.inner.store;
        let has_credentials = store.has_stored_credentials().await;
        tracing::info!("credential check: stored={has_credentials}");

        if !has_credentials {
            self.inner.state.send_modify(|s| {
                s.has_credentials = false;
                s.clear_display();
            });
            return;
        }

        // Best-effort read; the refresh below reports load failures.
        let threshold = match store.load_credentials().await {
            Ok(creds) => creds.warning_threshold_days,
            Err(e) => {
                tracing::warn!("threshold unavailable, using default: {e}");
                DEFAULT_WARNING_THRESHOLD_DAYS
            }
        };
        self.inner.state.send_modify(|s| {
            s.has_credentials = true;
            s.warning_threshold_days = threshold;
        });
        self.request_refresh(true).await;
    }

    /// Reset display fields and the threshold to their defaults.
    pub fn clear_data(&self) {
        tracing::info!("clearing worklog data");
        self.inner.state.send_modify(EngineState::clear_display);
    }

    async fn request_refresh(&self, requeue: bool) {
        match self.begin_refresh(requeue) {
            RefreshStart::Skipped => tracing::debug!("refresh skipped: no credentials"),
            RefreshStart::Coalesced => {
                tracing::debug!("refresh already in flight, waiting for it");
                self.wait_until_idle().await;
            }
            RefreshStart::Started => {
                // The task owns the commit; a JoinError here means it was
                // cancelled by runtime shutdown.
                if let Err(e) = self.spawn_refresh().await {
                    tracing::warn!("refresh task did not finish: {e}");
                }
            }
        }
    }

    /// Enter loading, unless skipped or already loading, in one commit.
    ///
    /// With `requeue`, a coalesced request marks the in-flight refresh to
    /// run once more before it leaves the loading state.
    fn begin_refresh(&self, requeue: bool) -> RefreshStart {
        let mut start = RefreshStart::Skipped;
        self.inner.state.send_if_modified(|s| {
            if !s.has_credentials {
                return false;
            }
            if s.is_loading {
                if requeue {
                    self.inner.rerun.store(true, Ordering::SeqCst);
                }
                start = RefreshStart::Coalesced;
                return false;
            }
            s.is_loading = true;
            s.error_message = None;
            start = RefreshStart::Started;
            true
        });
        start
    }

    async fn wait_until_idle(&self) {
        let mut rx = self.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|s| !s.is_loading).await;
    }

    /// Spawn the task that fetches and commits, detached from the caller.
    fn spawn_refresh(&self) -> JoinHandle<()> {
        let engine = self.clone();
        tokio::spawn(async move { engine.run_refresh().await })
    }

    /// Fetch and commit until no further run is queued.
    async fn run_refresh(&self) {
        loop {
            tracing::info!("refresh started");
            let store = Arc::clone(&self.inner.store);
            let client = Arc::clone(&self.inner.client);
            // Inner task so a collaborator panic surfaces as a JoinError.
            let outcome = match tokio::spawn(fetch(store, client)).await {
                Ok(outcome) => outcome,
                Err(e) => Err(RefreshError::Other(anyhow!(e))),
            };
            if !self.commit(outcome) {
                break;
            }
            tracing::info!("credentials rechecked during refresh, fetching again");
        }
    }

    /// Publish one outcome. Returns true when a queued run should follow.
    fn commit(&self, outcome: Result<Fetched, RefreshError>) -> bool {
        match &outcome {
            Ok(fetched) => tracing::info!(
                "refresh succeeded: days_since_last_worklog={:?}",
                fetched.days
            ),
            Err(e) => tracing::error!("refresh failed: {e}"),
        }

        let mut again = false;
        self.inner.state.send_modify(|s| {
            let queued = self.inner.rerun.swap(false, Ordering::SeqCst);
            if !s.has_credentials {
                // Credentials were removed mid-fetch; the outcome is stale.
                tracing::info!("discarding refresh outcome: credentials removed");
                s.is_loading = false;
                return;
            }
            match outcome {
                Ok(fetched) => {
                    s.latest_worklog = fetched.worklog;
                    s.days_since_last_worklog = fetched.days;
                    s.error_message = None;
                }
                Err(e) => {
                    s.error_message = Some(e.to_string());
                    s.latest_worklog = None;
                    s.days_since_last_worklog = None;
                    if matches!(e, RefreshError::NoCredentials) {
                        s.has_credentials = false;
                    }
                }
            }
            again = queued && s.has_credentials;
            // A queued run starts in the same commit, as a fresh refresh.
            s.is_loading = again;
            if again {
                s.error_message = None;
            }
        });
        again
    }
}

/// Load credentials, then query worklog and day count together.
async fn fetch(
    store: Arc<dyn CredentialStore>,
    client: Arc<dyn WorklogClient>,
) -> Result<Fetched, RefreshError> {
    let creds = store.load_credentials().await?;
    let account_id = creds.account_id.as_deref();
    let (worklog, days) = tokio::join!(
        client.fetch_latest_worklog(&creds.api_token, &creds.jira_base_url, account_id),
        client.days_since_last_worklog(&creds.api_token, &creds.jira_base_url, account_id),
    );
    Ok(Fetched {
        worklog: worklog?,
        days,
    })
}
