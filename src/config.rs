//! Config model and persistence helpers.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

/// Top-level configuration stored in `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Remote time-tracking API settings.
    pub tempo: TempoCfg,
    /// Recurring refresh cadence.
    pub refresh: RefreshCfg,
    /// Where credentials live and how often to look for changes.
    pub credentials: CredentialsCfg,
    /// Log file destination and verbosity.
    pub logging: LoggingCfg,
}

/// Tempo REST API settings used by the worklog client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TempoCfg {
    /// Base URL of the Tempo API (without the version segment).
    pub api_base_url: String,
    /// Size of the trailing window searched for the latest worklog.
    pub lookback_days: u32,
    /// Per-request timeout for API calls.
    pub request_timeout_secs: u64,
}

/// Recurring refresh settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefreshCfg {
    /// Seconds between timer-driven refreshes.
    pub interval_secs: u64,
}

/// Credential file settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CredentialsCfg {
    /// Path of the JSON credential record.
    pub path: PathBuf,
    /// Seconds between change checks on the credential file.
    pub poll_interval_secs: u64,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingCfg {
    /// Log file written next to the working directory.
    pub file: String,
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
}

impl Config {
    /// Load from disk or create defaults when missing.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let s = fs::read_to_string(path)?;
            Ok(toml::from_str(&s)?)
        } else {
            let cfg = Self::default();
            cfg.save(path)?;
            Ok(cfg)
        }
    }

    /// Persist the config as pretty TOML.
    pub fn save(&self, path: &Path) -> Result<()> {
        let s = toml::to_string_pretty(self)?;
        fs::write(path, s)?;
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        // A zero interval would make tokio's interval panic.
        Duration::from_secs(self.refresh.interval_secs.max(1))
    }

    pub fn credentials_poll_interval(&self) -> Duration {
        Duration::from_secs(self.credentials.poll_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.tempo.request_timeout_secs)
    }
}

impl Default for Config {
    /// Hourly refresh against the public Tempo cloud API.
    fn default() -> Self {
        Self {
            tempo: TempoCfg {
                api_base_url: "https://api.tempo.io".into(),
                lookback_days: 60,
                request_timeout_secs: 30,
            },
            refresh: RefreshCfg {
                interval_secs: 60 * 60,
            },
            credentials: CredentialsCfg {
                path: PathBuf::from("credentials.json"),
                poll_interval_secs: 5,
            },
            logging: LoggingCfg {
                file: "worklog_tui.log".into(),
                level: "info".into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_or_default_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let cfg = Config::load_or_default(&path).unwrap();

        assert!(path.exists());
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.refresh_interval(), Duration::from_secs(3600));
    }

    #[test]
    fn test_load_reads_saved_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.refresh.interval_secs = 120;
        cfg.tempo.lookback_days = 14;
        cfg.save(&path).unwrap();

        let loaded = Config::load_or_default(&path).unwrap();

        assert_eq!(loaded.refresh_interval(), Duration::from_secs(120));
        assert_eq!(loaded.tempo.lookback_days, 14);
    }

    #[test]
    fn test_zero_intervals_are_clamped() {
        let mut cfg = Config::default();
        cfg.refresh.interval_secs = 0;
        cfg.credentials.poll_interval_secs = 0;

        assert_eq!(cfg.refresh_interval(), Duration::from_secs(1));
        assert_eq!(cfg.credentials_poll_interval(), Duration::from_secs(1));
    }
}
