//! Language model provider abstractions and integrations.
//!
//! Defines the core LLM trait and implementations for the supported hosted
//! providers: Ollama, OpenAI, Groq, and Gemini. Each client speaks its
//! provider's wire protocol behind a common blocking/streaming interface.

pub use crate::core_types::{ChunkStream, LLMResponse, Message};
use crate::errors::AssistantError;
use async_trait::async_trait;

pub mod providers;
pub mod stream;

#[async_trait]
pub trait LLM: Send + Sync {
    /// Runs a blocking completion over the given messages.
    async fn generate(&self, messages: Vec<Message>) -> Result<LLMResponse, AssistantError>;

    /// Runs a streaming completion, yielding text chunks as the provider
    /// emits them. Chunks are forwarded in arrival order without buffering.
    async fn stream_generate(&self, messages: Vec<Message>) -> Result<ChunkStream, AssistantError>;
}
