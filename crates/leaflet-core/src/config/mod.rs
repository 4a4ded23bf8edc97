//! Client configuration.
//!
//! `ClientConfig` tells a client where its database lives and how to reach
//! the sync endpoint. Values come from a JSON file, then environment
//! variables override them.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::User;
use crate::util::{is_http_url, normalize_text_option};

pub const ENV_API_URL: &str = "LEAFLET_API_URL";
pub const ENV_API_TOKEN: &str = "LEAFLET_API_TOKEN";
pub const ENV_SYNC_TIMEOUT_SECS: &str = "LEAFLET_SYNC_TIMEOUT_SECS";

const DEFAULT_SYNC_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default)]
    pub sync_timeout_secs: Option<u64>,
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    /// Signed-in user; absent means anonymous
    #[serde(default)]
    pub user: Option<User>,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ClientConfig")
            .field("api_base_url", &self.api_base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("sync_timeout_secs", &self.sync_timeout_secs)
            .field("database_path", &self.database_path)
            .field("user", &self.user)
            .finish()
    }
}

impl ClientConfig {
    /// Parse and validate a JSON config payload
    pub fn from_json(payload: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(payload)
            .map_err(|error| Error::InvalidInput(format!("invalid config JSON: {error}")))?;
        config.validated()
    }

    /// Load from `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(payload) => Self::from_json(&payload),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Apply overrides from the process environment
    pub fn with_env(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, keyed by the `LEAFLET_*` variable names
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(url) = normalize_text_option(lookup(ENV_API_URL)) {
            self.api_base_url = Some(url);
        }
        if let Some(token) = normalize_text_option(lookup(ENV_API_TOKEN)) {
            self.api_token = Some(token);
        }
        if let Some(raw) = normalize_text_option(lookup(ENV_SYNC_TIMEOUT_SECS)) {
            let secs = raw.parse::<u64>().map_err(|_| {
                Error::InvalidInput(format!("{ENV_SYNC_TIMEOUT_SECS} must be a whole number"))
            })?;
            self.sync_timeout_secs = Some(secs);
        }
        self.validated()
    }

    pub fn sync_timeout(&self) -> Duration {
        Duration::from_secs(self.sync_timeout_secs.unwrap_or(DEFAULT_SYNC_TIMEOUT_SECS))
    }

    pub fn is_sync_configured(&self) -> bool {
        self.api_base_url.is_some()
    }

    fn validated(mut self) -> Result<Self> {
        self.api_base_url = match normalize_text_option(self.api_base_url) {
            Some(url) if is_http_url(&url) => Some(url.trim_end_matches('/').to_string()),
            Some(_) => {
                return Err(Error::InvalidInput(
                    "api_base_url must include http:// or https://".to_string(),
                ))
            }
            None => None,
        };
        self.api_token = normalize_text_option(self.api_token);
        if self.sync_timeout_secs == Some(0) {
            return Err(Error::InvalidInput(
                "sync_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(self)
    }
}
