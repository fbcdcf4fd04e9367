//! Runtime configuration.
//!
//! Values are resolved per field with the precedence: explicit builder value
//! (usually a CLI flag), then environment variable, then default. Call
//! [`load_dotenv`] first to pick up a `.env` file.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::llm::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT, ModelClientBuilder};
use crate::search::{DuckDuckGoClientBuilder, RetryPolicy, SearchClient, SearchError};

pub const ENV_API_KEY: &str = "SUTRA_API_KEY";
pub const ENV_BASE_URL: &str = "SUTRA_BASE_URL";
pub const ENV_MODEL: &str = "SUTRA_MODEL";
pub const ENV_MODEL_TIMEOUT: &str = "NEWSUM_MODEL_TIMEOUT_SECS";
pub const ENV_SEARCH_RESULTS: &str = "NEWSUM_SEARCH_RESULTS";
pub const ENV_SEARCH_ATTEMPTS: &str = "NEWSUM_SEARCH_ATTEMPTS";
pub const ENV_SEARCH_EMPTY_BACKOFF: &str = "NEWSUM_SEARCH_EMPTY_BACKOFF_SECS";
pub const ENV_SEARCH_ERROR_BACKOFF: &str = "NEWSUM_SEARCH_ERROR_BACKOFF_SECS";
pub const ENV_SEARCH_TIMEOUT: &str = "NEWSUM_SEARCH_TIMEOUT_SECS";

/// Errors raised while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable held a value that does not parse
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },

    /// A `.env` file could not be read
    #[error("Failed to load environment file: {0}")]
    Dotenv(#[from] dotenvy::Error),
}

/// Loads `.env` from the current directory or its parents, if present.
///
/// A missing file is not an error.
pub fn load_dotenv() -> Result<(), ConfigError> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Loads a specific env file.
pub fn load_dotenv_from(path: &Path) -> Result<(), ConfigError> {
    dotenvy::from_path(path)?;
    Ok(())
}

/// Search-related settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    pub max_results: usize,
    pub retry: RetryPolicy,
    pub timeout: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: SearchClient::DEFAULT_MAX_RESULTS,
            retry: RetryPolicy::default(),
            timeout: Duration::from_secs(20),
        }
    }
}

/// Resolved application configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub model_timeout: Duration,
    pub search: SearchConfig,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("model_timeout", &self.model_timeout)
            .field("search", &self.search)
            .finish()
    }
}

impl Config {
    /// Resolves configuration from the environment and defaults only.
    pub fn from_env() -> Result<Self, ConfigError> {
        ConfigBuilder::new().build()
    }

    /// Returns true if a usable API key is configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Returns a model client builder carrying this configuration.
    pub fn model_client_builder(&self) -> ModelClientBuilder {
        let mut builder = ModelClientBuilder::new()
            .base_url(&self.base_url)
            .model(&self.model)
            .timeout(self.model_timeout);
        if let Some(key) = &self.api_key {
            builder = builder.api_key(key);
        }
        builder
    }

    /// Builds the DuckDuckGo-backed search client.
    pub fn search_client(&self) -> Result<SearchClient, SearchError> {
        let provider = DuckDuckGoClientBuilder::new()
            .timeout(self.search.timeout)
            .build()?;
        Ok(SearchClient::new(Arc::new(provider))
            .with_policy(self.search.retry)
            .with_max_results(self.search.max_results))
    }
}

/// Builder for `Config`.
#[derive(Default)]
pub struct ConfigBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    model_timeout: Option<Duration>,
    max_results: Option<usize>,
    max_attempts: Option<usize>,
    empty_backoff: Option<Duration>,
    error_backoff: Option<Duration>,
    search_timeout: Option<Duration>,
}

impl ConfigBuilder {
    /// Creates a builder with nothing set explicitly.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn model_timeout(mut self, timeout: Duration) -> Self {
        self.model_timeout = Some(timeout);
        self
    }

    pub fn max_results(mut self, n: usize) -> Self {
        self.max_results = Some(n);
        self
    }

    pub fn max_attempts(mut self, n: usize) -> Self {
        self.max_attempts = Some(n);
        self
    }

    pub fn empty_backoff(mut self, wait: Duration) -> Self {
        self.empty_backoff = Some(wait);
        self
    }

    pub fn error_backoff(mut self, wait: Duration) -> Self {
        self.error_backoff = Some(wait);
        self
    }

    pub fn search_timeout(mut self, timeout: Duration) -> Self {
        self.search_timeout = Some(timeout);
        self
    }

    /// Resolves every field.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a numeric environment variable
    /// does not parse.
    pub fn build(self) -> Result<Config, ConfigError> {
        let defaults = SearchConfig::default();

        // Empty keys count as missing
        let api_key = self
            .api_key
            .or_else(|| env_string(ENV_API_KEY))
            .filter(|k| !k.trim().is_empty());

        let search = SearchConfig {
            max_results: resolve(self.max_results, ENV_SEARCH_RESULTS, defaults.max_results)?,
            retry: RetryPolicy {
                max_attempts: resolve(
                    self.max_attempts,
                    ENV_SEARCH_ATTEMPTS,
                    defaults.retry.max_attempts,
                )?,
                empty_backoff: resolve_secs(
                    self.empty_backoff,
                    ENV_SEARCH_EMPTY_BACKOFF,
                    defaults.retry.empty_backoff,
                )?,
                error_backoff: resolve_secs(
                    self.error_backoff,
                    ENV_SEARCH_ERROR_BACKOFF,
                    defaults.retry.error_backoff,
                )?,
            },
            timeout: resolve_secs(self.search_timeout, ENV_SEARCH_TIMEOUT, defaults.timeout)?,
        };

        Ok(Config {
            api_key,
            base_url: self
                .base_url
                .or_else(|| env_string(ENV_BASE_URL))
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: self
                .model
                .or_else(|| env_string(ENV_MODEL))
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            model_timeout: resolve_secs(
                self.model_timeout,
                ENV_MODEL_TIMEOUT,
                DEFAULT_TIMEOUT,
            )?,
            search,
        })
    }
}

fn env_string(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.is_empty())
}

fn resolve<T: FromStr>(explicit: Option<T>, var: &'static str, default: T) -> Result<T, ConfigError> {
    if let Some(value) = explicit {
        return Ok(value);
    }
    match env_string(var) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { var, value: raw }),
        None => Ok(default),
    }
}

fn resolve_secs(
    explicit: Option<Duration>,
    var: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    if let Some(value) = explicit {
        return Ok(value);
    }
    match env_string(var) {
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .ok_or(ConfigError::InvalidValue { var, value: raw }),
        None => Ok(default),
    }
}
