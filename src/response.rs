//! Model responses and summary text extraction.
//!
//! A chat completion either parses into a typed [`RunResponse`] or is kept as
//! the raw response body. [`extract_content`] turns either form into plain
//! text and never fails.

use std::fmt;

/// Typed result of a successful model run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResponse {
    content: String,
    model: String,
    finish_reason: Option<String>,
}

impl RunResponse {
    /// Creates a run response.
    pub fn new(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: model.into(),
            finish_reason: None,
        }
    }

    /// Sets why generation stopped (e.g., "stop", "length").
    #[must_use]
    pub fn with_finish_reason(mut self, reason: impl Into<String>) -> Self {
        self.finish_reason = Some(reason.into());
        self
    }

    /// Returns the generated text.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the model identifier reported by the endpoint.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the finish reason, if the endpoint reported one.
    pub fn finish_reason(&self) -> Option<&str> {
        self.finish_reason.as_deref()
    }
}

impl fmt::Display for RunResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RunResponse(content='{}', model='{}'", self.content, self.model)?;
        if let Some(reason) = &self.finish_reason {
            write!(f, ", finish_reason='{reason}'")?;
        }
        write!(f, ")")
    }
}

/// What a model call produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelResponse {
    /// A response with a typed `content` field
    Structured(RunResponse),
    /// An opaque body that needs textual extraction
    Raw(String),
}

impl ModelResponse {
    /// Returns the `content` field when the response is structured.
    pub fn content(&self) -> Option<&str> {
        match self {
            ModelResponse::Structured(run) => Some(run.content()),
            ModelResponse::Raw(_) => None,
        }
    }
}

impl fmt::Display for ModelResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelResponse::Structured(run) => fmt::Display::fmt(run, f),
            ModelResponse::Raw(text) => f.write_str(text),
        }
    }
}

const CONTENT_MARKER: &str = "content='";

/// Extracts the summary text from a model response.
///
/// Structured responses yield their `content` verbatim; anything else goes
/// through [`extract_from_text`] on its textual form.
///
/// # Examples
///
/// ```
/// use newsum::response::{extract_content, ModelResponse, RunResponse};
///
/// let structured = ModelResponse::Structured(RunResponse::new("Hello world", "sutra-v2"));
/// assert_eq!(extract_content(&structured), "Hello world");
///
/// let raw = ModelResponse::Raw("RunResponse(content='Hi', model='m')".to_string());
/// assert_eq!(extract_content(&raw), "Hi");
/// ```
pub fn extract_content(response: &ModelResponse) -> String {
    match response.content() {
        Some(content) => content.to_string(),
        None => extract_from_text(&response.to_string()),
    }
}

/// Pulls the text between `content='` and the next `'` out of a textual dump.
///
/// Returns the input unchanged when the marker or the closing quote is missing.
pub fn extract_from_text(text: &str) -> String {
    let Some(start) = text.find(CONTENT_MARKER).map(|i| i + CONTENT_MARKER.len()) else {
        return text.to_string();
    };

    match text[start..].find('\'') {
        Some(len) => text[start..start + len].to_string(),
        None => text.to_string(),
    }
}
