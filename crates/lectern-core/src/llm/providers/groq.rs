//! Groq client
//!
//! Groq exposes an OpenAI-compatible chat-completions endpoint, so this
//! client wraps the OpenAI implementation pointed at the Groq API base.

use crate::config::ServiceConfig;
use crate::core_types::{ChunkStream, LLMResponse, Message};
use crate::errors::AssistantError;
use crate::llm::providers::openai::OpenAIClient;
use crate::llm::LLM;
use async_trait::async_trait;
use std::sync::Arc;

pub const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";

#[derive(Debug, Clone)]
pub struct GroqClient {
    pub(crate) inner: OpenAIClient,
}

impl GroqClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            inner: OpenAIClient::new(api_key, model).with_api_base(GROQ_API_BASE.to_string()),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.inner = self.inner.with_temperature(temperature);
        self
    }
}

#[async_trait]
impl LLM for GroqClient {
    async fn generate(&self, messages: Vec<Message>) -> Result<LLMResponse, AssistantError> {
        self.inner.generate(messages).await
    }

    async fn stream_generate(&self, messages: Vec<Message>) -> Result<ChunkStream, AssistantError> {
        self.inner.stream_generate(messages).await
    }
}

pub(crate) fn client_from_config(config: &ServiceConfig) -> Result<GroqClient, AssistantError> {
    let api_key = super::require_api_key("GROQ_API_KEY")?;
    log::info!("Loading Groq model: {}", config.model_id);

    Ok(GroqClient::new(api_key, config.model_id.clone()).with_temperature(config.temperature))
}

/// Create a Groq LLM client from configuration.
pub fn create_client(config: &ServiceConfig) -> Result<Arc<dyn LLM>, AssistantError> {
    Ok(Arc::new(client_from_config(config)?))
}
