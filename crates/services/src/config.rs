use std::env;
use std::time::Duration;

use url::Url;

use crate::error::ConfigLoadError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/v1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const BASE_URL_VAR: &str = "VOCAB_API_BASE_URL";
const TIMEOUT_VAR: &str = "VOCAB_API_TIMEOUT_MS";

/// Remote API location and request defaults.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ApiConfig {
    /// Build a config for `base_url` with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns `ConfigLoadError::InvalidBaseUrl` unless the value is an
    /// absolute `http`/`https` URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigLoadError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let parsed = Url::parse(trimmed).map_err(|err| ConfigLoadError::InvalidBaseUrl {
            raw: base_url.to_owned(),
            reason: err.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigLoadError::InvalidBaseUrl {
                raw: base_url.to_owned(),
                reason: format!("unsupported scheme `{}`", parsed.scheme()),
            });
        }
        Ok(Self {
            base_url: trimmed.to_owned(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read `VOCAB_API_BASE_URL` and `VOCAB_API_TIMEOUT_MS`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigLoadError` if the base URL is set but invalid.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigLoadError> {
        let base_url = lookup(BASE_URL_VAR)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.into());
        // Unparsable or zero timeouts fall back to the default.
        let timeout = lookup(TIMEOUT_VAR)
            .and_then(|value| value.trim().parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .map_or(DEFAULT_TIMEOUT, Duration::from_millis);
        Ok(Self::new(&base_url)?.with_timeout(timeout))
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}
