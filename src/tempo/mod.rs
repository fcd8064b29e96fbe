//! Worklog model and the client interface used by the engine.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use thiserror::Error;

/// Tempo REST API client.
pub mod client;

pub use client::HttpWorklogClient;

/// Issue a worklog was booked against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssueRef {
    /// Issue key such as `PROJ-12` (numeric id when no key is reported).
    pub key: String,
    pub summary: Option<String>,
}

/// One remote time entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Worklog {
    /// Start as local wall-clock time, as reported by Tempo.
    pub started_at: NaiveDateTime,
    pub time_spent_seconds: u64,
    pub comment: Option<String>,
    pub issue: Option<IssueRef>,
}

/// Failures of a worklog fetch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TempoError {
    #[error("API token is missing")]
    MissingCredentials,
    #[error("invalid Jira base URL")]
    InvalidUrl,
    #[error("unauthorized, check the API token")]
    Unauthorized,
    #[error("access forbidden")]
    Forbidden,
    #[error("resource not found")]
    NotFound,
    #[error("network error: {0}")]
    NetworkError(String),
    #[error("API returned status {0}")]
    ApiError(u16),
}

/// Queries the latest worklog for one user.
#[async_trait]
pub trait WorklogClient: Send + Sync {
    /// Most recent worklog in the trailing window, if any.
    async fn fetch_latest_worklog(
        &self,
        api_token: &str,
        jira_base_url: &str,
        account_id: Option<&str>,
    ) -> Result<Option<Worklog>, TempoError>;

    /// Whole days since the most recent worklog; `None` on any failure.
    async fn days_since_last_worklog(
        &self,
        api_token: &str,
        jira_base_url: &str,
        account_id: Option<&str>,
    ) -> Option<i64>;
}
