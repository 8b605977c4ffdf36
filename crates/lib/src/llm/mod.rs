//! Completion backends: the backend abstraction plus the OpenAI-compatible
//! chat completion client.

mod openai;

pub use openai::{ChatChoice, ChatMessage, ChatResponse, CompletionError, OpenAiClient, DEFAULT_MODEL};

use async_trait::async_trait;

/// A stateless request/response completion service. One operation; every
/// failure (network, quota, malformed response) is treated uniformly by the
/// relay.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<String, CompletionError>;
}
