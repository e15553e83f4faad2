//! Upstream completion API
//!
//! The API routes only ever talk to the model through [`CompletionClient`],
//! so the transport can be swapped out in tests.

mod groq;
mod types;

use async_trait::async_trait;

use crate::error::RelayError;

pub use groq::GroqClient;
pub use types::{ChatMessage, CompletionRequest};

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send one completion request and return `choices[0].message.content`.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, RelayError>;
}
