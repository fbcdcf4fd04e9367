/// Web search module.
///
/// This module provides the `SearchProvider` seam, a DuckDuckGo implementation,
/// and `SearchClient`, which wraps a provider with bounded retry and backoff.
mod client;
mod duckduckgo;

pub use client::{RetryPolicy, SearchClient, SearchError, SearchProvider, SearchRecord};
pub use duckduckgo::{DuckDuckGoClient, DuckDuckGoClientBuilder};
