//! Shared test doubles for exercising the chat surface without a provider.

use crate::core_types::{ChunkStream, LLMResponse, Message};
use crate::errors::AssistantError;
use crate::llm::LLM;
use async_trait::async_trait;
use std::sync::Mutex;

/// Scripted LLM that records every prompt it receives.
pub struct MockLLM {
    completion: String,
    chunks: Vec<String>,
    failure: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl MockLLM {
    /// Mock whose blocking completion always returns `text`.
    pub fn completing(text: impl Into<String>) -> Self {
        Self {
            completion: text.into(),
            chunks: Vec::new(),
            failure: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Mock whose streaming completion yields `chunks` in order. The
    /// blocking completion returns their concatenation.
    pub fn streaming(chunks: &[&str]) -> Self {
        Self {
            completion: chunks.concat(),
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            failure: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Mock that fails every call with the given message.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            completion: String::new(),
            chunks: Vec::new(),
            failure: Some(message.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// The most recent prompt, rendered as the concatenated message contents.
    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    fn record(&self, messages: &[Message]) {
        let rendered = messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        self.prompts.lock().unwrap().push(rendered);
    }
}

#[async_trait]
impl LLM for MockLLM {
    async fn generate(&self, messages: Vec<Message>) -> Result<LLMResponse, AssistantError> {
        self.record(&messages);
        if let Some(message) = &self.failure {
            return Err(AssistantError::Llm(message.clone()));
        }
        Ok(LLMResponse::from_text(self.completion.clone()))
    }

    async fn stream_generate(&self, messages: Vec<Message>) -> Result<ChunkStream, AssistantError> {
        self.record(&messages);
        if let Some(message) = &self.failure {
            return Err(AssistantError::Llm(message.clone()));
        }
        let chunks = self.chunks.clone();
        Ok(Box::pin(futures_util::stream::iter(
            chunks.into_iter().map(Ok),
        )))
    }
}
