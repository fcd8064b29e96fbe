//! Credential storage implementation backed by a local JSON file.

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::{io::ErrorKind, path::PathBuf};
use tokio::{
    fs,
    io::{AsyncWriteExt, BufWriter},
};

use super::{CredentialError, CredentialStore, Credentials};

/// On-disk shape of the credential record.
#[derive(Debug, Serialize, Deserialize)]
struct StoredCredentials {
    /// Token encoded with URL-safe base64 so it is not plain text at a glance.
    api_token: String,
    #[serde(default)]
    account_id: Option<String>,
    jira_base_url: String,
    warning_threshold_days: u32,
}

/// Stores the credential record in a local JSON file (credentials.json).
#[derive(Clone, Debug)]
pub struct FileCredentialStore {
    /// Location of the record on disk.
    path: PathBuf,
}

impl FileCredentialStore {
    /// Create a new store backed by the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the raw file; `None` when missing or empty.
    async fn read_raw(&self) -> Result<Option<Vec<u8>>, CredentialError> {
        match fs::read(&self.path).await {
            Ok(data) if data.is_empty() => Ok(None),
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CredentialError::DecodingFailed(e.to_string())),
        }
    }

    /// Decode raw bytes into a credential record.
    fn decode(data: &[u8]) -> Result<Credentials, CredentialError> {
        let stored: StoredCredentials = serde_json::from_slice(data)
            .map_err(|e| CredentialError::DecodingFailed(e.to_string()))?;
        let token_bytes = URL_SAFE_NO_PAD
            .decode(stored.api_token.as_bytes())
            .map_err(|e| CredentialError::DecodingFailed(format!("api_token: {e}")))?;
        let api_token = String::from_utf8(token_bytes)
            .map_err(|e| CredentialError::DecodingFailed(format!("api_token: {e}")))?;
        if stored.warning_threshold_days == 0 {
            return Err(CredentialError::DecodingFailed(
                "warning_threshold_days must be at least 1".into(),
            ));
        }
        Ok(Credentials {
            api_token,
            account_id: stored.account_id.filter(|id| !id.trim().is_empty()),
            jira_base_url: stored.jira_base_url,
            warning_threshold_days: stored.warning_threshold_days,
        })
    }

    /// Persist the record, creating directories if needed.
    pub async fn save(&self, creds: &Credentials) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }
        let stored = StoredCredentials {
            api_token: URL_SAFE_NO_PAD.encode(creds.api_token.as_bytes()),
            account_id: creds.account_id.clone(),
            jira_base_url: creds.jira_base_url.clone(),
            warning_threshold_days: creds.warning_threshold_days,
        };
        let data = serde_json::to_vec_pretty(&stored)?;
        let file = fs::File::create(&self.path).await?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&data).await?;
        writer.flush().await?;
        tracing::info!("credentials saved to {}", self.path.display());
        Ok(())
    }

    /// Remove the stored record; a missing file is not an error.
    pub async fn delete(&self) -> anyhow::Result<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                tracing::info!("credentials removed from {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// SHA-256 of the stored bytes, or `None` when nothing is stored.
    pub async fn fingerprint(&self) -> Option<[u8; 32]> {
        let data = self.read_raw().await.ok()??;
        Some(Sha256::digest(&data).into())
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn has_stored_credentials(&self) -> bool {
        matches!(self.read_raw().await, Ok(Some(_)))
    }

    async fn load_credentials(&self) -> Result<Credentials, CredentialError> {
        let data = self
            .read_raw()
            .await?
            .ok_or(CredentialError::NoStoredCredentials)?;
        Self::decode(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Credentials {
        Credentials {
            api_token: "tempo-token".into(),
            account_id: Some("557058:abc".into()),
            jira_base_url: "https://example.atlassian.net".into(),
            warning_threshold_days: 5,
        }
    }

    #[tokio::test]
    async fn test_missing_file_reports_no_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));

        assert!(!store.has_stored_credentials().await);
        assert_eq!(
            store.load_credentials().await,
            Err(CredentialError::NoStoredCredentials)
        );
        assert!(store.fingerprint().await.is_none());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("nested/credentials.json"));

        store.save(&sample()).await.unwrap();

        assert!(store.has_stored_credentials().await);
        assert_eq!(store.load_credentials().await.unwrap(), sample());
    }

    #[tokio::test]
    async fn test_token_is_not_stored_in_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let store = FileCredentialStore::new(&path);

        store.save(&sample()).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("tempo-token"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_decoding_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = FileCredentialStore::new(&path);

        assert!(store.has_stored_credentials().await);
        assert!(matches!(
            store.load_credentials().await,
            Err(CredentialError::DecodingFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_bad_token_encoding_is_decoding_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(
            &path,
            r#"{"api_token":"***","jira_base_url":"https://x","warning_threshold_days":7}"#,
        )
        .unwrap();
        let store = FileCredentialStore::new(&path);

        let err = store.load_credentials().await.unwrap_err();
        assert!(matches!(err, CredentialError::DecodingFailed(ref m) if m.starts_with("api_token")));
    }

    #[tokio::test]
    async fn test_zero_threshold_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));
        let mut creds = sample();
        creds.warning_threshold_days = 0;
        store.save(&creds).await.unwrap();

        assert!(matches!(
            store.load_credentials().await,
            Err(CredentialError::DecodingFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_fingerprint_tracks_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));

        store.save(&sample()).await.unwrap();
        let first = store.fingerprint().await;
        let mut creds = sample();
        creds.warning_threshold_days = 9;
        store.save(&creds).await.unwrap();
        let second = store.fingerprint().await;

        assert!(first.is_some());
        assert_ne!(first, second);

        store.delete().await.unwrap();
        assert!(store.fingerprint().await.is_none());
        // Deleting twice is fine.
        store.delete().await.unwrap();
    }
}
