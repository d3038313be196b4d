//! Query tools exposed to the agent runner
//!
//! Each tool pairs a query-answering engine with a name and a human-readable
//! description used for routing. Tools are assembled once at startup and
//! shared read-only with the agent runner and the HTTP listing endpoint.

use crate::core_types::Message;
use crate::errors::AssistantError;
use crate::llm::LLM;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

pub mod code_tool;
pub mod document_search;
pub mod paper_search;

/// A query-answering capability. This is the only contract a tool exposes.
#[async_trait]
pub trait QueryEngine: Send + Sync {
    async fn query(&self, query: &str) -> Result<String, AssistantError>;
}

/// Retrieves context nodes relevant to a query.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str) -> Result<Vec<SourceNode>, AssistantError>;
}

/// A piece of retrieved context, optionally carrying a relevance score.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceNode {
    pub text: String,
    pub score: Option<f32>,
}

impl SourceNode {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            score: None,
        }
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }
}

/// Serializable tool summary for listing endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
}

/// A named query engine registered with the agent runner.
pub struct QueryTool {
    name: String,
    description: String,
    engine: Arc<dyn QueryEngine>,
}

impl QueryTool {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        engine: Arc<dyn QueryEngine>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            engine,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn info(&self) -> ToolInfo {
        ToolInfo {
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }

    pub async fn query(&self, query: &str) -> Result<String, AssistantError> {
        log::info!("Tool '{}' handling query", self.name);
        self.engine
            .query(query)
            .await
            .map_err(|e| AssistantError::Tool {
                tool_name: self.name.clone(),
                message: e.to_string(),
            })
    }
}

/// Registry holding the static tool set assembled at startup.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<QueryTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_tool(&mut self, tool: Arc<QueryTool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get_tool(&self, name: &str) -> Option<Arc<QueryTool>> {
        self.tools.get(name).cloned()
    }

    pub fn list_tools(&self) -> Vec<ToolInfo> {
        let mut infos: Vec<ToolInfo> = self.tools.values().map(|tool| tool.info()).collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }
}

/// Fills a prompt template carrying `{context_str}` and `{query_str}` slots.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn format(&self, query: &str, context: &str) -> String {
        self.template
            .replace("{context_str}", context)
            .replace("{query_str}", query)
    }
}

/// Synthesizes a final answer from a query and retrieved context nodes with
/// a single LLM call.
pub struct ResponseSynthesizer {
    llm: Arc<dyn LLM>,
    qa_prompt: PromptTemplate,
}

impl ResponseSynthesizer {
    pub fn new(llm: Arc<dyn LLM>, qa_prompt: PromptTemplate) -> Self {
        Self { llm, qa_prompt }
    }

    pub fn format_prompt(&self, query: &str, nodes: &[SourceNode]) -> String {
        let context = nodes
            .iter()
            .map(|node| node.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        self.qa_prompt.format(query, &context)
    }

    pub async fn synthesize(
        &self,
        query: &str,
        nodes: &[SourceNode],
    ) -> Result<String, AssistantError> {
        let prompt = self.format_prompt(query, nodes);
        let response = self.llm.generate(vec![Message::user(prompt)]).await?;
        response
            .content
            .ok_or_else(|| AssistantError::Llm("LLM returned an empty response".to_string()))
    }
}

/// Generic engine composing a retriever with a response synthesizer.
pub struct RetrieverQueryEngine {
    retriever: Arc<dyn Retriever>,
    synthesizer: ResponseSynthesizer,
}

impl RetrieverQueryEngine {
    pub fn new(retriever: Arc<dyn Retriever>, synthesizer: ResponseSynthesizer) -> Self {
        Self {
            retriever,
            synthesizer,
        }
    }
}

#[async_trait]
impl QueryEngine for RetrieverQueryEngine {
    async fn query(&self, query: &str) -> Result<String, AssistantError> {
        let nodes = self.retriever.retrieve(query).await?;
        log::debug!("Retrieved {} context nodes", nodes.len());
        self.synthesizer.synthesize(query, &nodes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::QA_PROMPT;
    use crate::test_utils::MockLLM;

    struct FixedRetriever(Vec<SourceNode>);

    #[async_trait]
    impl Retriever for FixedRetriever {
        async fn retrieve(&self, _query: &str) -> Result<Vec<SourceNode>, AssistantError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_prompt_template_formatting() {
        let template = PromptTemplate::new("C: {context_str} Q: {query_str}");
        assert_eq!(template.format("why?", "because"), "C: because Q: why?");
    }

    #[test]
    fn test_registry_lists_tools_sorted() {
        struct NullEngine;
        #[async_trait]
        impl QueryEngine for NullEngine {
            async fn query(&self, _query: &str) -> Result<String, AssistantError> {
                Ok(String::new())
            }
        }

        let mut registry = ToolRegistry::new();
        registry.register_tool(Arc::new(QueryTool::new("zeta", "z", Arc::new(NullEngine))));
        registry.register_tool(Arc::new(QueryTool::new("alpha", "a", Arc::new(NullEngine))));

        let infos = registry.list_tools();
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[0].name, "alpha");
        assert_eq!(infos[1].name, "zeta");
        assert!(registry.get_tool("alpha").is_some());
        assert!(registry.get_tool("missing").is_none());
    }

    #[tokio::test]
    async fn test_retriever_engine_feeds_context_to_synthesizer() {
        let llm = Arc::new(MockLLM::completing("grounded answer"));
        let engine = RetrieverQueryEngine::new(
            Arc::new(FixedRetriever(vec![
                SourceNode::new("first fact"),
                SourceNode::new("second fact"),
            ])),
            ResponseSynthesizer::new(llm.clone(), PromptTemplate::new(QA_PROMPT)),
        );

        let answer = engine.query("what facts?").await.unwrap();
        assert_eq!(answer, "grounded answer");

        let prompt = llm.last_prompt().unwrap();
        assert!(prompt.contains("first fact\n\nsecond fact"));
        assert!(prompt.contains("Query: what facts?"));
    }

    #[tokio::test]
    async fn test_tool_wraps_engine_errors() {
        struct FailingEngine;
        #[async_trait]
        impl QueryEngine for FailingEngine {
            async fn query(&self, _query: &str) -> Result<String, AssistantError> {
                Err(AssistantError::Llm("backend down".to_string()))
            }
        }

        let tool = QueryTool::new("paper_search_tool", "papers", Arc::new(FailingEngine));
        let err = tool.query("anything").await.unwrap_err();
        match err {
            AssistantError::Tool { tool_name, message } => {
                assert_eq!(tool_name, "paper_search_tool");
                assert!(message.contains("backend down"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
