//! Text generation seam
//!
//! The chat layer talks to the generative-text service through this trait so
//! the transport can be swapped out in tests.

use async_trait::async_trait;
use thiserror::Error;

/// Failure modes of a generation call
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The service could not be reached at all
    #[error("connection refused at {url}")]
    ConnectionRefused { url: String },
    /// The call went through but the reply had no usable text
    #[error("no response text in service reply")]
    MissingResponse,
    /// Any other transport or HTTP failure
    #[error("request failed: {0}")]
    Request(String),
}

/// Interface for sending a prompt to a generative-text service
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Send a prompt and return the generated text
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
}
