mod client;
pub mod types;

use anyhow::Result;
use reqwest::StatusCode;

pub use client::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmErrorKind {
    RateLimited,
    Server,
    Network,
    Timeout,
    Client,
    Deserialize,
    Unknown,
}

pub fn classify_error(status: Option<StatusCode>, err: &anyhow::Error) -> LlmErrorKind {
    if let Some(st) = status {
        if st == StatusCode::TOO_MANY_REQUESTS {
            return LlmErrorKind::RateLimited;
        }
        if st.is_server_error() {
            return LlmErrorKind::Server;
        }
        if st.is_client_error() {
            return LlmErrorKind::Client;
        }
    }
    if let Some(e) = err.downcast_ref::<reqwest::Error>() {
        if e.is_timeout() {
            return LlmErrorKind::Timeout;
        }
        if e.is_connect() || e.is_body() || e.is_request() {
            return LlmErrorKind::Network;
        }
        if e.is_decode() {
            return LlmErrorKind::Deserialize;
        }
    }
    if err.downcast_ref::<serde_json::Error>().is_some() {
        return LlmErrorKind::Deserialize;
    }
    LlmErrorKind::Unknown
}

/// Sampling options for a single completion
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            max_tokens: 1000,
        }
    }
}

/// A text-completion backend. Failures are plain errors; callers decide
/// whether they are recoverable.
#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Name of the backend for logging
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String>;
}
