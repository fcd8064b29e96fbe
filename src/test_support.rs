//! In-memory collaborators for engine tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};
use tokio::sync::Notify;

use crate::{
    credentials::{CredentialError, CredentialStore, Credentials},
    tempo::{IssueRef, TempoError, Worklog, WorklogClient},
};

pub fn sample_credentials(threshold: u32) -> Credentials {
    Credentials {
        api_token: "tok".into(),
        account_id: Some("acc-1".into()),
        jira_base_url: "https://example.atlassian.net".into(),
        warning_threshold_days: threshold,
    }
}

pub fn sample_worklog() -> Worklog {
    Worklog {
        started_at: NaiveDate::from_ymd_opt(2024, 5, 7)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap(),
        time_spent_seconds: 5400,
        comment: Some("Sprint planning".into()),
        issue: Some(IssueRef {
            key: "PROJ-42".into(),
            summary: Some("Planning".into()),
        }),
    }
}

/// Credential store with scripted answers.
pub struct FakeStore {
    stored: AtomicBool,
    load: Mutex<Result<Credentials, CredentialError>>,
    loads: AtomicUsize,
}

impl FakeStore {
    pub fn with(load: Result<Credentials, CredentialError>) -> Self {
        Self {
            stored: AtomicBool::new(true),
            load: Mutex::new(load),
            loads: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        let store = Self::with(Err(CredentialError::NoStoredCredentials));
        store.set_stored(false);
        store
    }

    pub fn set_stored(&self, stored: bool) {
        self.stored.store(stored, Ordering::SeqCst);
    }

    pub fn set_load_result(&self, load: Result<Credentials, CredentialError>) {
        *self.load.lock().unwrap() = load;
    }

    pub fn load_calls(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialStore for FakeStore {
    async fn has_stored_credentials(&self) -> bool {
        self.stored.load(Ordering::SeqCst)
    }

    async fn load_credentials(&self) -> Result<Credentials, CredentialError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.load.lock().unwrap().clone()
    }
}

/// Worklog client with scripted answers and call counters.
pub struct FakeWorklogClient {
    fetch: Mutex<Result<Option<Worklog>, TempoError>>,
    days: Mutex<Option<i64>>,
    fetches: AtomicUsize,
    day_queries: AtomicUsize,
    gate: Mutex<Option<Arc<Notify>>>,
    panic_on_fetch: AtomicBool,
}

impl FakeWorklogClient {
    pub fn returning(fetch: Result<Option<Worklog>, TempoError>, days: Option<i64>) -> Self {
        Self {
            fetch: Mutex::new(fetch),
            days: Mutex::new(days),
            fetches: AtomicUsize::new(0),
            day_queries: AtomicUsize::new(0),
            gate: Mutex::new(None),
            panic_on_fetch: AtomicBool::new(false),
        }
    }

    pub fn set_fetch_result(&self, fetch: Result<Option<Worklog>, TempoError>) {
        *self.fetch.lock().unwrap() = fetch;
    }

    pub fn set_days(&self, days: Option<i64>) {
        *self.days.lock().unwrap() = days;
    }

    /// Make the next fetch wait until the returned gate is notified.
    pub fn hold(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn panic_on_fetch(&self) {
        self.panic_on_fetch.store(true, Ordering::SeqCst);
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn days_calls(&self) -> usize {
        self.day_queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorklogClient for FakeWorklogClient {
    async fn fetch_latest_worklog(
        &self,
        _api_token: &str,
        _jira_base_url: &str,
        _account_id: Option<&str>,
    ) -> Result<Option<Worklog>, TempoError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.panic_on_fetch.load(Ordering::SeqCst) {
            panic!("worklog client blew up");
        }
        // The answer is fixed when the request goes out, not when it returns.
        let result = self.fetch.lock().unwrap().clone();
        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        result
    }

    async fn days_since_last_worklog(
        &self,
        _api_token: &str,
        _jira_base_url: &str,
        _account_id: Option<&str>,
    ) -> Option<i64> {
        self.day_queries.fetch_add(1, Ordering::SeqCst);
        *self.days.lock().unwrap()
    }
}
