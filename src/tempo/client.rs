//! Tempo / Jira REST helpers.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Local, NaiveDate, NaiveTime};
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;

use super::{IssueRef, TempoError, Worklog, WorklogClient};

/// Upper bound on followed `metadata.next` links per fetch.
const MAX_PAGES: usize = 50;
/// Page size requested from Tempo.
const PAGE_LIMIT: u32 = 1000;

/// Jira `myself` response, used to resolve the account id.
#[derive(Debug, Deserialize)]
struct Myself {
    #[serde(rename = "accountId")]
    account_id: String,
}

/// One page of Tempo worklogs.
#[derive(Debug, Deserialize)]
struct WorklogPage {
    #[serde(default)]
    results: Vec<TempoWorklog>,
    #[serde(default)]
    metadata: Option<PageMetadata>,
}

/// Paging info; `next` is an absolute URL.
#[derive(Debug, Deserialize)]
struct PageMetadata {
    #[serde(default)]
    next: Option<String>,
}

/// Worklog as returned by the Tempo v4 API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TempoWorklog {
    start_date: NaiveDate,
    #[serde(default)]
    start_time: Option<NaiveTime>,
    #[serde(default)]
    time_spent_seconds: u64,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    issue: Option<TempoIssue>,
}

/// Issue reference; v4 only guarantees the numeric id.
#[derive(Debug, Deserialize)]
struct TempoIssue {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    summary: Option<String>,
}

impl TempoWorklog {
    fn into_worklog(self) -> Worklog {
        let w = self;
        let issue = w.issue.and_then(|i| {
            let key = i.key.or_else(|| i.id.map(|id| id.to_string()))?;
            Some(IssueRef {
                key,
                summary: i.summary,
            })
        });
        Worklog {
            started_at: w.start_date.and_time(w.start_time.unwrap_or(NaiveTime::MIN)),
            time_spent_seconds: w.time_spent_seconds,
            comment: w.description.filter(|d| !d.trim().is_empty()),
            issue,
        }
    }
}

/// Worklog client talking to Tempo over HTTPS.
#[derive(Clone, Debug)]
pub struct HttpWorklogClient {
    /// Shared HTTP client for all API calls.
    http: Client,
    /// Tempo API root, e.g. `https://api.tempo.io`.
    api_base_url: String,
    /// Size of the trailing search window.
    lookback_days: u32,
}

impl HttpWorklogClient {
    /// Build a client with a per-request timeout.
    pub fn new(
        api_base_url: impl Into<String>,
        lookback_days: u32,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_base_url: api_base_url.into(),
            lookback_days,
        })
    }

    /// Latest worklog, or a classified error.
    async fn latest(
        &self,
        api_token: &str,
        jira_base_url: &str,
        account_id: Option<&str>,
    ) -> Result<Option<Worklog>, TempoError> {
        if api_token.trim().is_empty() {
            return Err(TempoError::MissingCredentials);
        }
        let jira = parse_base_url(jira_base_url)?;
        let account_id = self.resolve_account_id(api_token, &jira, account_id).await?;

        let worklogs = self.fetch_window(api_token, &account_id).await?;
        tracing::debug!("tempo returned {} worklogs", worklogs.len());
        Ok(worklogs
            .into_iter()
            .map(TempoWorklog::into_worklog)
            .max_by_key(|w| w.started_at))
    }

    /// Use the configured account id, or ask Jira who the token belongs to.
    async fn resolve_account_id(
        &self,
        api_token: &str,
        jira: &Url,
        account_id: Option<&str>,
    ) -> Result<String, TempoError> {
        if let Some(id) = account_id.map(str::trim).filter(|id| !id.is_empty()) {
            return Ok(id.to_string());
        }
        let url = format!("{}/rest/api/3/myself", jira.as_str().trim_end_matches('/'));
        tracing::debug!("resolving account id via {url}");
        let me: Myself = get_json(&self.http, api_token, &url).await?;
        Ok(me.account_id)
    }

    /// All worklogs of `account_id` in the trailing window, following pages.
    async fn fetch_window(
        &self,
        api_token: &str,
        account_id: &str,
    ) -> Result<Vec<TempoWorklog>, TempoError> {
        let to = Local::now().date_naive();
        let from = to - ChronoDuration::days(i64::from(self.lookback_days));
        let mut url = format!(
            "{}/4/worklogs/user/{}?from={}&to={}&limit={}",
            self.api_base_url.trim_end_matches('/'),
            urlencoding::encode(account_id),
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d"),
            PAGE_LIMIT
        );

        let mut all = Vec::new();
        for _ in 0..MAX_PAGES {
            let page: WorklogPage = get_json(&self.http, api_token, &url).await?;
            all.extend(page.results);
            match page.metadata.and_then(|m| m.next) {
                Some(next) if !next.is_empty() => url = next,
                _ => return Ok(all),
            }
        }
        tracing::warn!("stopped paging after {MAX_PAGES} pages");
        Ok(all)
    }
}

#[async_trait]
impl WorklogClient for HttpWorklogClient {
    async fn fetch_latest_worklog(
        &self,
        api_token: &str,
        jira_base_url: &str,
        account_id: Option<&str>,
    ) -> Result<Option<Worklog>, TempoError> {
        self.latest(api_token, jira_base_url, account_id).await
    }

    async fn days_since_last_worklog(
        &self,
        api_token: &str,
        jira_base_url: &str,
        account_id: Option<&str>,
    ) -> Option<i64> {
        match self.latest(api_token, jira_base_url, account_id).await {
            Ok(latest) => {
                latest.map(|w| days_between(w.started_at.date(), Local::now().date_naive()))
            }
            Err(e) => {
                tracing::warn!("days since last worklog unavailable: {e}");
                None
            }
        }
    }
}

/// Whole days from `from` to `today`, never negative.
pub fn days_between(from: NaiveDate, today: NaiveDate) -> i64 {
    (today - from).num_days().max(0)
}

/// Accept only absolute http(s) URLs.
fn parse_base_url(raw: &str) -> Result<Url, TempoError> {
    let url = Url::parse(raw.trim()).map_err(|_| TempoError::InvalidUrl)?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        _ => Err(TempoError::InvalidUrl),
    }
}

/// GET with bearer auth and decode the JSON body.
async fn get_json<T: DeserializeOwned>(
    http: &Client,
    token: &str,
    url: &str,
) -> Result<T, TempoError> {
    let resp = http
        .get(url)
        .bearer_auth(token)
        .header("Accept", "application/json")
        .send()
        .await
        .map_err(|e| TempoError::NetworkError(e.to_string()))?;
    let resp = ensure_success(resp).await?;
    resp.json::<T>()
        .await
        .map_err(|e| TempoError::NetworkError(e.to_string()))
}

/// Convert non-2xx responses into the error taxonomy.
async fn ensure_success(resp: reqwest::Response) -> Result<reqwest::Response, TempoError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let url = resp.url().clone();
    let body = resp.text().await.unwrap_or_default();
    tracing::debug!("HTTP status {status} from {url}: {body}");
    Err(match status {
        StatusCode::UNAUTHORIZED => TempoError::Unauthorized,
        StatusCode::FORBIDDEN => TempoError::Forbidden,
        StatusCode::NOT_FOUND => TempoError::NotFound,
        other => TempoError::ApiError(other.as_u16()),
    })
}
