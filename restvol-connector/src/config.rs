//! Connection configuration.
//!
//! The endpoint and credentials come from, in order of preference, the
//! `HSDS_*` environment variables or a `.hscfg` file in the user's home
//! directory. A TOML form is also accepted for embedding the connector in
//! applications that already keep TOML settings.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{ConnectorError, ConnectorResult};

pub const ENV_ENDPOINT: &str = "HSDS_ENDPOINT";
pub const ENV_USERNAME: &str = "HSDS_USERNAME";
pub const ENV_PASSWORD: &str = "HSDS_PASSWORD";

const HSCFG_FILE_NAME: &str = ".hscfg";

/// Endpoint, credentials and transport settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorConfig {
    /// Base URL of the service (e.g. `http://localhost:5101`).
    pub endpoint: String,
    /// Basic-auth user name. Authentication is skipped when unset or empty.
    pub username: Option<String>,
    pub password: Option<String>,
    /// Whole-request timeout. `None` waits indefinitely.
    pub timeout_secs: Option<u64>,
    pub user_agent: String,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:5101".to_string(),
            username: None,
            password: None,
            timeout_secs: None,
            user_agent: concat!("restvol/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ConnectorConfig {
    /// Creates a config for `endpoint` with all other settings defaulted.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = Some(timeout.as_secs());
        self
    }

    /// Reads `HSDS_ENDPOINT`, `HSDS_USERNAME` and `HSDS_PASSWORD`.
    ///
    /// Fails if no endpoint is set.
    pub fn from_env() -> ConnectorResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`ConnectorConfig::from_env`] with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConnectorResult<Self> {
        let endpoint = lookup(ENV_ENDPOINT)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConnectorError::Config(format!("{ENV_ENDPOINT} is not set")))?;

        let config = Self {
            endpoint,
            username: lookup(ENV_USERNAME).filter(|v| !v.is_empty()),
            password: lookup(ENV_PASSWORD).filter(|v| !v.is_empty()),
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Parses the `.hscfg` format: `key = value` lines, `#` comments.
    ///
    /// Recognised keys are `hs_endpoint`, `hs_username` and `hs_password`;
    /// everything else is ignored.
    pub fn from_hscfg_str(contents: &str) -> ConnectorResult<Self> {
        let mut endpoint = None;
        let mut config = Self::default();

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.trim() {
                "hs_endpoint" => endpoint = Some(value.to_string()),
                "hs_username" => config.username = Some(value.to_string()),
                "hs_password" => config.password = Some(value.to_string()),
                other => debug!("Ignoring .hscfg key {}", other),
            }
        }

        config.endpoint = endpoint
            .ok_or_else(|| ConnectorError::Config("hs_endpoint missing from config file".to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_hscfg(path: &Path) -> ConnectorResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConnectorError::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_hscfg_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> ConnectorResult<Self> {
        let config: Self = toml::from_str(contents)
            .map_err(|e| ConnectorError::Config(format!("invalid TOML config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_toml(path: &Path) -> ConnectorResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConnectorError::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml_str(&contents)
    }

    /// Loads a config file, choosing the format by extension (`.toml` or
    /// anything else for `.hscfg`).
    pub fn load(path: &Path) -> ConnectorResult<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::load_toml(path),
            _ => Self::load_hscfg(path),
        }
    }

    /// Environment first, then `$HOME/.hscfg`.
    pub fn discover() -> ConnectorResult<Self> {
        if std::env::var(ENV_ENDPOINT).is_ok_and(|v| !v.is_empty()) {
            info!("Using connection settings from environment");
            return Self::from_env();
        }

        let path = hscfg_path().ok_or_else(|| {
            ConnectorError::Config(format!(
                "{ENV_ENDPOINT} is not set and no home directory to search for {HSCFG_FILE_NAME}"
            ))
        })?;
        info!("Using connection settings from {:?}", path);
        Self::load_hscfg(&path)
    }

    pub fn validate(&self) -> ConnectorResult<()> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(ConnectorError::Config(format!(
                "endpoint must be an http:// or https:// URL, got {:?}",
                self.endpoint
            )));
        }
        if self.password.is_some() && self.username.is_none() {
            return Err(ConnectorError::Config(
                "password given without a username".to_string(),
            ));
        }
        Ok(())
    }

    /// Endpoint without a trailing slash, ready for path concatenation.
    pub fn base_url(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

fn hscfg_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .ok()
        .map(|home| Path::new(&home).join(HSCFG_FILE_NAME))
}
