/// Search error types, the provider trait, and the retrying search client.
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while querying a search provider.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Network-related errors (connection failures, DNS resolution, etc.)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Request or response timeout errors
    #[error("Search request timed out")]
    Timeout(#[source] reqwest::Error),

    /// Non-success HTTP status
    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    /// The provider is throttling this client
    #[error("Search provider rate limit reached")]
    RateLimited,

    /// The response body could not be interpreted
    #[error("Failed to parse search results: {0}")]
    Parse(String),
}

impl SearchError {
    /// Classifies a reqwest error as a timeout or a generic network failure.
    pub(crate) fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            SearchError::Timeout(error)
        } else {
            SearchError::Network(error)
        }
    }
}

/// A single search hit: a title and a short body snippet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRecord {
    pub title: String,
    pub body: String,
    /// Link to the result page. Empty when the provider did not supply one.
    pub href: String,
}

impl SearchRecord {
    /// Creates a record without a link.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            href: String::new(),
        }
    }

    /// Sets the result link.
    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = href.into();
        self
    }
}

/// Trait for a single search attempt against a provider.
///
/// This trait enables mocking in unit tests. Implementations perform exactly
/// one request per call; retrying is the job of [`SearchClient`].
pub trait SearchProvider: Send + Sync {
    /// Returns a short identifier for the provider (e.g., "duckduckgo").
    fn name(&self) -> &str;

    /// Runs a text search and returns up to `max_results` records in provider order.
    fn text(&self, query: &str, max_results: usize) -> Result<Vec<SearchRecord>, SearchError>;
}

/// Retry and backoff settings for [`SearchClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one.
    pub max_attempts: usize,
    /// Wait after an attempt that returned no results.
    pub empty_backoff: Duration,
    /// Wait after an attempt that failed with an error.
    pub error_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            empty_backoff: Duration::from_secs(2),
            error_backoff: Duration::from_secs(3),
        }
    }
}

impl RetryPolicy {
    /// A policy with the given attempt count and no waiting between attempts.
    pub fn immediate(max_attempts: usize) -> Self {
        Self {
            max_attempts,
            empty_backoff: Duration::ZERO,
            error_backoff: Duration::ZERO,
        }
    }
}

/// Search client that retries a provider on empty results and transient errors.
#[derive(Clone)]
pub struct SearchClient {
    provider: Arc<dyn SearchProvider>,
    policy: RetryPolicy,
    max_results: usize,
}

impl SearchClient {
    /// Default number of records requested from the provider.
    pub const DEFAULT_MAX_RESULTS: usize = 5;

    /// Creates a client with the default retry policy and result count.
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self {
            provider,
            policy: RetryPolicy::default(),
            max_results: Self::DEFAULT_MAX_RESULTS,
        }
    }

    /// Replaces the retry policy.
    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets how many records to request per attempt.
    #[must_use]
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Returns the underlying provider's name.
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Returns the configured retry policy.
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Returns the number of records requested per attempt.
    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// Searches with bounded retry.
    ///
    /// Returns as soon as an attempt yields at least one record. An attempt
    /// with no records waits `empty_backoff` before the next one; a failed
    /// attempt waits `error_backoff`. The error of the final attempt is
    /// returned as-is. If every attempt comes back empty, the result is an
    /// empty `Vec`, not an error.
    ///
    /// # Errors
    ///
    /// Returns the provider's `SearchError` if the last allowed attempt fails.
    pub fn search(&self, query: &str) -> Result<Vec<SearchRecord>, SearchError> {
        let attempts = self.policy.max_attempts;

        for attempt in 1..=attempts {
            let is_last = attempt == attempts;
            tracing::debug!(
                provider = self.provider.name(),
                attempt,
                attempts,
                "search attempt"
            );

            match self.provider.text(query, self.max_results) {
                Ok(records) if !records.is_empty() => {
                    for record in &records {
                        tracing::debug!(title = %record.title, href = %record.href, "search hit");
                    }
                    return Ok(records);
                }
                Ok(_) => {
                    tracing::debug!(attempt, "search returned no results");
                    if !is_last {
                        thread::sleep(self.policy.empty_backoff);
                    }
                }
                Err(e) => {
                    if is_last {
                        tracing::warn!(attempt, error = %e, "search failed on final attempt");
                        return Err(e);
                    }
                    tracing::debug!(attempt, error = %e, "search attempt failed, retrying");
                    thread::sleep(self.policy.error_backoff);
                }
            }
        }

        Ok(Vec::new())
    }
}
