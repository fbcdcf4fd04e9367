/// DuckDuckGo HTML search provider.
///
/// Uses the JavaScript-free HTML endpoint, which needs no API key, and scrapes
/// result titles, snippets and links with `scraper`.
use std::time::Duration;

use reqwest::Url;
use reqwest::header::USER_AGENT;
use scraper::{ElementRef, Html, Selector};

use super::client::{SearchError, SearchProvider, SearchRecord};

const DEFAULT_ENDPOINT: &str = "https://html.duckduckgo.com/html/";
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Builder for constructing `DuckDuckGoClient` instances.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use newsum::search::DuckDuckGoClientBuilder;
///
/// let client = DuckDuckGoClientBuilder::new()
///     .timeout(Duration::from_secs(20))
///     .build()
///     .expect("Failed to create search client");
/// assert_eq!(client.endpoint(), "https://html.duckduckgo.com/html/");
/// ```
#[derive(Debug, Default)]
pub struct DuckDuckGoClientBuilder {
    endpoint: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl DuckDuckGoClientBuilder {
    /// Creates a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the HTML search endpoint.
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = Some(url.into());
        self
    }

    /// Sets the per-request timeout (default 20 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Overrides the User-Agent header sent with each request.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Parse` if the endpoint is not a valid URL, or
    /// `SearchError::Network` if the HTTP client cannot be constructed.
    pub fn build(self) -> Result<DuckDuckGoClient, SearchError> {
        let endpoint = self.endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        Url::parse(&endpoint)
            .map_err(|e| SearchError::Parse(format!("invalid endpoint {endpoint}: {e}")))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout.unwrap_or(Duration::from_secs(20)))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(SearchError::Network)?;

        Ok(DuckDuckGoClient {
            client,
            endpoint,
            user_agent: self
                .user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        })
    }
}

/// Synchronous DuckDuckGo text search client.
pub struct DuckDuckGoClient {
    client: reqwest::blocking::Client,
    endpoint: String,
    user_agent: String,
}

impl DuckDuckGoClient {
    /// Returns the configured search endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl SearchProvider for DuckDuckGoClient {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    fn text(&self, query: &str, max_results: usize) -> Result<Vec<SearchRecord>, SearchError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(USER_AGENT, &self.user_agent)
            .form(&[("q", query), ("b", "")])
            .send()
            .map_err(SearchError::from_reqwest)?;

        let status = response.status();
        // DuckDuckGo answers throttled clients with 202 and a challenge page
        if status.as_u16() == 202 {
            return Err(SearchError::RateLimited);
        }
        if !status.is_success() {
            return Err(SearchError::Http {
                status: status.as_u16(),
            });
        }

        let html = response.text().map_err(SearchError::from_reqwest)?;
        parse_results(&html, max_results)
    }
}

/// Parses DuckDuckGo HTML results, skipping ads and DuckDuckGo-internal links.
fn parse_results(html: &str, max_results: usize) -> Result<Vec<SearchRecord>, SearchError> {
    let result_selector = selector("div.result")?;
    let title_selector = selector("a.result__a")?;
    let snippet_selector = selector(".result__snippet")?;

    let document = Html::parse_document(html);
    let mut records = Vec::new();

    for element in document.select(&result_selector) {
        if records.len() >= max_results {
            break;
        }
        if element.value().classes().any(|c| c == "result--ad") {
            continue;
        }

        let Some(title_elem) = element.select(&title_selector).next() else {
            continue;
        };
        let title = collapse_text(title_elem);
        if title.is_empty() {
            continue;
        }

        let href = title_elem
            .value()
            .attr("href")
            .map(resolve_link)
            .unwrap_or_default();
        if href.is_empty() || href.contains("duckduckgo.com") {
            continue;
        }

        let body = element
            .select(&snippet_selector)
            .next()
            .map(collapse_text)
            .unwrap_or_default();

        records.push(SearchRecord::new(title, body).with_href(href));
    }

    Ok(records)
}

fn selector(css: &str) -> Result<Selector, SearchError> {
    Selector::parse(css).map_err(|e| SearchError::Parse(format!("selector {css}: {e:?}")))
}

/// Joins an element's text nodes and normalizes whitespace.
fn collapse_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolves DuckDuckGo redirect links (`//duckduckgo.com/l/?uddg=...`) to the target URL.
fn resolve_link(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    };

    match Url::parse(&absolute) {
        Ok(url) if url.path().starts_with("/l/") => url
            .query_pairs()
            .find(|(key, _)| key == "uddg")
            .map(|(_, target)| target.into_owned())
            .unwrap_or(absolute),
        _ => absolute,
    }
}
