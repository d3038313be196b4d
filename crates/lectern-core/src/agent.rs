//! Agent chat surface and runner
//!
//! The service consumes exactly two operations from the agent: a blocking
//! chat and a streaming chat. `AgentRunner` implements them over the shared
//! LLM handle by composing the system prompt with the registered tool
//! descriptions. Tool selection is left to the model; the runner applies no
//! routing policy of its own.

use crate::core_types::{ChunkStream, Message};
use crate::errors::AssistantError;
use crate::llm::LLM;
use crate::tools::QueryTool;
use async_trait::async_trait;
use std::sync::Arc;

/// Final response of a blocking chat.
pub struct ChatResponse {
    pub response: String,
}

/// Incremental response of a streaming chat.
pub struct StreamingChatResponse {
    pub response_gen: ChunkStream,
}

#[async_trait]
pub trait ChatEngine: Send + Sync {
    async fn chat(&self, prompt: &str) -> Result<ChatResponse, AssistantError>;
    async fn stream_chat(&self, prompt: &str) -> Result<StreamingChatResponse, AssistantError>;
}

pub struct AgentRunner {
    llm: Arc<dyn LLM>,
    system_prompt: String,
    tools: Vec<Arc<QueryTool>>,
}

impl AgentRunner {
    /// Builds a runner around the shared LLM handle, a static tool set, and
    /// a base system prompt.
    pub fn from_llm(llm: Arc<dyn LLM>, tools: Vec<Arc<QueryTool>>, system_prompt: &str) -> Self {
        let system_prompt = Self::compose_system_prompt(system_prompt, &tools);
        Self {
            llm,
            system_prompt,
            tools,
        }
    }

    pub fn tools(&self) -> &[Arc<QueryTool>] {
        &self.tools
    }

    fn compose_system_prompt(base: &str, tools: &[Arc<QueryTool>]) -> String {
        if tools.is_empty() {
            return base.to_string();
        }
        let mut prompt = String::from(base);
        prompt.push_str("\n\nAvailable tools:\n");
        for tool in tools {
            prompt.push_str(&format!("- {}: {}\n", tool.name(), tool.description()));
        }
        prompt
    }

    fn build_messages(&self, prompt: &str) -> Vec<Message> {
        vec![
            Message::system(self.system_prompt.clone()),
            Message::user(prompt),
        ]
    }
}

#[async_trait]
impl ChatEngine for AgentRunner {
    async fn chat(&self, prompt: &str) -> Result<ChatResponse, AssistantError> {
        let response = self.llm.generate(self.build_messages(prompt)).await?;
        let response = response
            .content
            .ok_or_else(|| AssistantError::Llm("LLM returned an empty response".to_string()))?;
        Ok(ChatResponse { response })
    }

    async fn stream_chat(&self, prompt: &str) -> Result<StreamingChatResponse, AssistantError> {
        let response_gen = self.llm.stream_generate(self.build_messages(prompt)).await?;
        Ok(StreamingChatResponse { response_gen })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockLLM;
    use crate::tools::{QueryEngine, QueryTool};
    use futures_util::StreamExt;

    struct NullEngine;

    #[async_trait]
    impl QueryEngine for NullEngine {
        async fn query(&self, _query: &str) -> Result<String, AssistantError> {
            Ok(String::new())
        }
    }

    fn sample_tool() -> Arc<QueryTool> {
        Arc::new(QueryTool::new(
            "paper_search_tool",
            "Searches papers",
            Arc::new(NullEngine),
        ))
    }

    #[tokio::test]
    async fn test_chat_returns_final_response() {
        let llm = Arc::new(MockLLM::completing("final answer"));
        let runner = AgentRunner::from_llm(llm.clone(), vec![], "Be helpful.");

        let response = runner.chat("question").await.unwrap();
        assert_eq!(response.response, "final answer");

        let prompt = llm.last_prompt().unwrap();
        assert!(prompt.starts_with("Be helpful."));
        assert!(prompt.ends_with("question"));
    }

    #[tokio::test]
    async fn test_stream_chat_passes_chunks_through_in_order() {
        let llm = Arc::new(MockLLM::streaming(&["a", "b", "c"]));
        let runner = AgentRunner::from_llm(llm, vec![], "Be helpful.");

        let mut stream = runner.stream_chat("question").await.unwrap().response_gen;
        let mut collected = Vec::new();
        while let Some(chunk) = stream.next().await {
            collected.push(chunk.unwrap());
        }
        assert_eq!(collected, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_system_prompt_carries_tool_descriptions() {
        let llm = Arc::new(MockLLM::completing("ok"));
        let runner = AgentRunner::from_llm(llm.clone(), vec![sample_tool()], "Base.");

        runner.chat("q").await.unwrap();
        let prompt = llm.last_prompt().unwrap();
        assert!(prompt.contains("Available tools:"));
        assert!(prompt.contains("paper_search_tool: Searches papers"));
    }

    #[tokio::test]
    async fn test_generation_errors_propagate_unmodified() {
        let llm = Arc::new(MockLLM::failing("provider exploded"));
        let runner = AgentRunner::from_llm(llm, vec![], "Base.");

        let Err(err) = runner.chat("q").await else {
            panic!("expected chat to fail");
        };
        match err {
            AssistantError::Llm(message) => assert_eq!(message, "provider exploded"),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
