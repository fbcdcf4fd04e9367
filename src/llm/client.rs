/// Chat completion client implementation.
///
/// This module provides `ModelClient` for making synchronous requests to an
/// OpenAI-compatible `/chat/completions` endpoint, along with error types and
/// the builder used to configure it.
use std::fmt;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use thiserror::Error;

use crate::response::{ModelResponse, RunResponse};

/// Default endpoint of the Sutra API.
pub const DEFAULT_BASE_URL: &str = "https://api.two.ai/v2";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "sutra-v2";

/// Default timeout for a single model call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// System instruction sent with every request.
const SYSTEM_PROMPT: &str = "Use markdown to format your answers.";

/// Errors that can occur when calling the model endpoint.
#[derive(Debug, Error)]
pub enum ModelError {
    /// No API key was configured
    #[error("Missing API key: set SUTRA_API_KEY or pass --api-key")]
    MissingApiKey,

    /// The API key cannot be sent as an HTTP header value
    #[error("Invalid API key: contains characters not allowed in an HTTP header")]
    InvalidApiKey,

    /// Invalid base URL configuration
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Network-related errors (connection failures, DNS resolution, etc.)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Request or response timeout errors
    #[error("Model request timed out")]
    Timeout(#[source] reqwest::Error),

    /// HTTP errors with status code and the endpoint's error message, if any
    #[error("HTTP error: status {status}{}", format_message(.message))]
    Http { status: u16, message: Option<String> },

    /// Endpoint-specific errors
    #[error("Model API error: {message}")]
    Api { message: String },
}

fn format_message(message: &Option<String>) -> String {
    message
        .as_ref()
        .map(|m| format!(" ({m})"))
        .unwrap_or_default()
}

impl ModelError {
    fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ModelError::Timeout(error)
        } else {
            ModelError::Network(error)
        }
    }

    /// Returns true for errors caused by configuration rather than the call itself.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ModelError::MissingApiKey | ModelError::InvalidApiKey | ModelError::InvalidUrl(_)
        )
    }
}

/// Builder for constructing `ModelClient` instances.
///
/// The API key is passed explicitly; the builder never reads or writes
/// process environment.
///
/// # Examples
///
/// ```
/// use newsum::llm::ModelClientBuilder;
///
/// let client = ModelClientBuilder::new()
///     .api_key("sk-test")
///     .model("sutra-v2")
///     .build()
///     .expect("Failed to create client");
/// assert_eq!(client.base_url(), "https://api.two.ai/v2");
/// ```
#[derive(Default)]
pub struct ModelClientBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout: Option<Duration>,
}

impl fmt::Debug for ModelClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelClientBuilder")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ModelClientBuilder {
    /// Creates a new `ModelClientBuilder` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key used as a bearer token.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the base URL (e.g., "https://api.two.ai/v2").
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the model identifier.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the timeout for a whole model call.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the `ModelClient`.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::MissingApiKey` if no non-empty key was set,
    /// `ModelError::InvalidApiKey` if the key cannot be sent as a header,
    /// `ModelError::InvalidUrl` if the base URL does not parse, and
    /// `ModelError::Network` if the HTTP client cannot be created.
    pub fn build(self) -> Result<ModelClient, ModelError> {
        let api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(ModelError::MissingApiKey)?;

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        reqwest::Url::parse(&base_url)
            .map_err(|e| ModelError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .map_err(|_| ModelError::InvalidApiKey)?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::blocking::Client::builder()
            .default_headers(headers)
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(ModelError::Network)?;

        Ok(ModelClient {
            client,
            base_url,
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }
}

/// Synchronous client for an OpenAI-compatible chat completion endpoint.
///
/// Construct with `ModelClientBuilder`. Calls are never retried here; a failed
/// call is reported to the caller as-is.
pub struct ModelClient {
    client: reqwest::blocking::Client,
    base_url: String,
    model: String,
}

/// Trait for model client operations.
///
/// This trait enables mocking in unit tests and keeps the orchestrator
/// independent of the HTTP transport.
pub trait ModelClientTrait: Send + Sync {
    /// Runs the prompt to completion without streaming.
    ///
    /// # Returns
    ///
    /// Returns the model's response, or an error if the request fails.
    fn run(&self, prompt: &str) -> Result<ModelResponse, ModelError>;
}

impl ModelClient {
    /// Returns the base URL configured for this client.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the model identifier configured for this client.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Lists model identifiers served by the endpoint (`GET {base}/models`).
    pub fn list_models(&self) -> Result<Vec<String>, ModelError> {
        let url = format!("{}/models", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(ModelError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ModelError::Http {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let json: serde_json::Value = response.json().map_err(ModelError::from_reqwest)?;

        Ok(json
            .get("data")
            .and_then(|d| d.as_array())
            .map(|models| {
                models
                    .iter()
                    .filter_map(|m| m.get("id").and_then(|id| id.as_str()))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default())
    }

    fn run_internal(&self, prompt: &str) -> Result<ModelResponse, ModelError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request_body = request_body(&self.model, prompt);

        let response = self
            .client
            .post(&url)
            .json(&request_body)
            .send()
            .map_err(ModelError::from_reqwest)?;

        let status = response.status();
        let body = response.text().map_err(ModelError::from_reqwest)?;

        if !status.is_success() {
            return Err(ModelError::Http {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        Ok(parse_completion(&body))
    }
}

impl ModelClientTrait for ModelClient {
    fn run(&self, prompt: &str) -> Result<ModelResponse, ModelError> {
        self.run_internal(prompt)
    }
}

/// Builds the JSON body for a non-streaming chat completion.
fn request_body(model: &str, prompt: &str) -> serde_json::Value {
    serde_json::json!({
        "model": model,
        "messages": [
            {"role": "system", "content": SYSTEM_PROMPT},
            {"role": "user", "content": prompt}
        ],
        "stream": false
    })
}

/// Interprets a successful response body.
///
/// Bodies with a string `choices[0].message.content` become a structured
/// response; anything else is kept verbatim for textual extraction.
fn parse_completion(body: &str) -> ModelResponse {
    let Ok(json) = serde_json::from_str::<serde_json::Value>(body) else {
        return ModelResponse::Raw(body.to_string());
    };

    let choice = json
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first());

    let content = choice
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str());

    match content {
        Some(content) => {
            let model = json.get("model").and_then(|m| m.as_str()).unwrap_or_default();
            let mut run = RunResponse::new(content, model);
            if let Some(reason) = choice
                .and_then(|c| c.get("finish_reason"))
                .and_then(|r| r.as_str())
            {
                run = run.with_finish_reason(reason);
            }
            ModelResponse::Structured(run)
        }
        None => ModelResponse::Raw(body.to_string()),
    }
}

/// Extracts `error.message` (or a string `error`) from an error body.
fn error_message(body: &str) -> Option<String> {
    let json: serde_json::Value = serde_json::from_str(body).ok()?;
    let error = json.get("error")?;
    error
        .get("message")
        .and_then(|m| m.as_str())
        .or_else(|| error.as_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_fails_without_api_key() {
        let result = ModelClientBuilder::new().build();
        assert!(matches!(result, Err(ModelError::MissingApiKey)));
    }

    #[test]
    fn build_treats_blank_api_key_as_missing() {
        let result = ModelClientBuilder::new().api_key("   ").build();
        assert!(matches!(result, Err(ModelError::MissingApiKey)));
    }

    #[test]
    fn build_uses_defaults_when_only_key_is_set() {
        let client = ModelClientBuilder::new().api_key("sk-test").build().unwrap();
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
        assert_eq!(client.model(), DEFAULT_MODEL);
    }

    #[test]
    fn build_trims_trailing_slash_from_base_url() {
        let client = ModelClientBuilder::new()
            .api_key("sk-test")
            .base_url("http://localhost:8080/v1/")
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/v1");
    }

    #[test]
    fn build_returns_error_if_invalid_url_provided() {
        let result = ModelClientBuilder::new()
            .api_key("sk-test")
            .base_url("not-a-valid-url")
            .build();
        assert!(matches!(result, Err(ModelError::InvalidUrl(_))));
    }

    #[test]
    fn build_rejects_key_with_control_characters() {
        let result = ModelClientBuilder::new().api_key("sk\ntest").build();
        assert!(matches!(result, Err(ModelError::Api { .. })));
    }

    #[test]
    fn builder_debug_redacts_api_key() {
        let builder = ModelClientBuilder::new().api_key("sk-secret-value");
        let debug = format!("{builder:?}");
        assert!(!debug.contains("sk-secret-value"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn api_key_with_control_characters_is_a_configuration_error() {
        let result = ModelClientBuilder::new().api_key("sk\ntest").build();
        let err = result.err().expect("builder should reject the key");
        assert!(matches!(err, ModelError::InvalidApiKey));
        assert!(err.is_configuration());
    }

    #[test]
    fn configuration_errors_are_classified() {
        assert!(ModelError::MissingApiKey.is_configuration());
        assert!(ModelError::InvalidApiKey.is_configuration());
        assert!(ModelError::InvalidUrl("x".to_string()).is_configuration());
        assert!(
            !ModelError::Http {
                status: 500,
                message: None
            }
            .is_configuration()
        );
    }

    #[test]
    fn http_error_display_includes_status_and_message() {
        let err = ModelError::Http {
            status: 401,
            message: Some("Invalid API key".to_string()),
        };
        assert_eq!(err.to_string(), "HTTP error: status 401 (Invalid API key)");

        let err = ModelError::Http {
            status: 502,
            message: None,
        };
        assert_eq!(err.to_string(), "HTTP error: status 502");
    }

    #[test]
    fn request_body_is_non_streaming_chat() {
        let body = request_body("sutra-v2", "Summarize tech news");
        assert_eq!(body["model"], "sutra-v2");
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "Summarize tech news");
    }

    #[test]
    fn parse_completion_extracts_structured_content() {
        let body = r#"{
            "id": "chatcmpl-1",
            "model": "sutra-v2",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "Hello world"}, "finish_reason": "stop"}
            ]
        }"#;

        match parse_completion(body) {
            ModelResponse::Structured(run) => {
                assert_eq!(run.content(), "Hello world");
                assert_eq!(run.model(), "sutra-v2");
                assert_eq!(run.finish_reason(), Some("stop"));
            }
            other => panic!("expected structured response, got {other:?}"),
        }
    }

    #[test]
    fn parse_completion_keeps_null_content_as_raw() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#;
        assert_eq!(parse_completion(body), ModelResponse::Raw(body.to_string()));
    }

    #[test]
    fn parse_completion_keeps_non_json_as_raw() {
        let body = "RunResponse(content='plain', model='m')";
        assert_eq!(parse_completion(body), ModelResponse::Raw(body.to_string()));
    }

    #[test]
    fn error_message_reads_openai_error_shape() {
        assert_eq!(
            error_message(r#"{"error": {"message": "quota exceeded", "type": "x"}}"#),
            Some("quota exceeded".to_string())
        );
        assert_eq!(
            error_message(r#"{"error": "bad key"}"#),
            Some("bad key".to_string())
        );
        assert_eq!(error_message("<html>502</html>"), None);
    }

    #[test]
    fn run_against_unreachable_endpoint_is_a_network_error() {
        let client = ModelClientBuilder::new()
            .api_key("sk-test")
            .base_url("http://127.0.0.1:9")
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();

        let result = client.run("hello");
        assert!(matches!(
            result,
            Err(ModelError::Network(_)) | Err(ModelError::Timeout(_))
        ));
    }

    #[test]
    fn trait_can_be_implemented_by_mock_struct() {
        struct MockClient;

        impl ModelClientTrait for MockClient {
            fn run(&self, _prompt: &str) -> Result<ModelResponse, ModelError> {
                Ok(ModelResponse::Structured(RunResponse::new("ok", "mock")))
            }
        }

        let client: &dyn ModelClientTrait = &MockClient;
        assert_eq!(client.run("x").unwrap().content(), Some("ok"));
    }
}
