/// Hosted LLM client module.
///
/// This module provides a blocking client for OpenAI-compatible chat completion
/// endpoints, including error handling and timeout configuration.
mod client;

pub use client::{
    DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT, ModelClient, ModelClientBuilder,
    ModelClientTrait, ModelError,
};
