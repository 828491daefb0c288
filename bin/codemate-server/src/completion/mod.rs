//! Text-completion client abstraction.
//!
//! [`CompletionClient`] is the seam between the handlers and the external
//! API. The production implementation is [`openai::OpenAiClient`]; tests
//! plug in a stub.

pub mod openai;

use async_trait::async_trait;
use thiserror::Error;

pub use openai::OpenAiClient;

/// Sampling parameters sent with every completion request.
///
/// The defaults are deterministic: temperature 0, no nucleus cut-off and no
/// penalties, with answers capped at 1000 tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub max_tokens: u32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            max_tokens: 1000,
        }
    }
}

/// Ways a completion call can fail.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// The API could not be reached or the connection broke.
    #[error("network error: {0}")]
    Network(String),

    /// The credential was missing or rejected.
    #[error("authentication with the completion API failed: {0}")]
    Auth(String),

    /// The account hit a rate limit or ran out of quota.
    #[error("rate limited by the completion API: {0}")]
    RateLimited(String),

    /// The API answered 2xx but the body had an unexpected shape.
    #[error("malformed completion response: {0}")]
    MalformedResponse(String),

    /// Any other non-success status.
    #[error("completion API returned {status}: {message}")]
    Api { status: u16, message: String },
}

impl CompletionError {
    /// Whether repeating the same request later could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            CompletionError::Network(_) | CompletionError::RateLimited(_) => true,
            CompletionError::Api { status, .. } => *status >= 500,
            CompletionError::Auth(_) | CompletionError::MalformedResponse(_) => false,
        }
    }
}

/// Something that turns a prompt into completion text.
#[async_trait]
pub trait CompletionClient: Send + Sync + 'static {
    /// Return the text of the first completion choice, untouched.
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}
