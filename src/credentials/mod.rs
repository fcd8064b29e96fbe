//! Credential record, storage trait, and change detection.

use async_trait::async_trait;
use thiserror::Error;

/// JSON file backed credential storage.
pub mod file_store;
/// Polls the store and re-checks credentials when they change.
pub mod watcher;

pub use file_store::FileCredentialStore;
pub use watcher::CredentialWatcher;

/// Threshold used whenever no stored value can be read.
pub const DEFAULT_WARNING_THRESHOLD_DAYS: u32 = 7;

/// Everything needed to query the worklog API for one user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
    /// Tempo API token (bearer).
    pub api_token: String,
    /// Atlassian account id; resolved from Jira when absent.
    pub account_id: Option<String>,
    /// Jira site, e.g. `https://example.atlassian.net`.
    pub jira_base_url: String,
    /// Days without a worklog before the status leaves healthy.
    pub warning_threshold_days: u32,
}

/// Failures surfaced by a credential store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("no credentials stored")]
    NoStoredCredentials,
    #[error("{0}")]
    DecodingFailed(String),
}

/// Source of the single stored credential record.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Cheap existence check; does not validate the record.
    async fn has_stored_credentials(&self) -> bool;

    /// Load and decode the stored record.
    async fn load_credentials(&self) -> Result<Credentials, CredentialError>;
}
