//! Code assistant tool
//!
//! Answers programming questions by prompting the LLM directly. The engine
//! performs no retrieval: synthesis always runs over a single placeholder
//! context node carrying the literal text "temp", regardless of the query.
//! Known gap; do not extend the placeholder into real retrieval here.

use crate::errors::AssistantError;
use crate::llm::LLM;
use crate::prompts::CODE_QA_PROMPT;
use crate::tools::{PromptTemplate, QueryEngine, QueryTool, ResponseSynthesizer, SourceNode};
use async_trait::async_trait;
use std::sync::Arc;

pub const CODE_TOOL_NAME: &str = "code_tool";
pub const CODE_TOOL_DESCRIPTION: &str = "Useful for answering code-based questions";

/// Placeholder text used as the sole context node for every query.
const PLACEHOLDER_CONTEXT: &str = "temp";

pub struct CodeQueryEngine {
    synthesizer: ResponseSynthesizer,
}

impl CodeQueryEngine {
    pub fn new(llm: Arc<dyn LLM>) -> Self {
        Self {
            synthesizer: ResponseSynthesizer::new(llm, PromptTemplate::new(CODE_QA_PROMPT)),
        }
    }

    /// Context handed to synthesis. Always the single placeholder node,
    /// regardless of the query.
    pub fn context_nodes(&self, _query: &str) -> Vec<SourceNode> {
        vec![SourceNode::new(PLACEHOLDER_CONTEXT)]
    }
}

#[async_trait]
impl QueryEngine for CodeQueryEngine {
    async fn query(&self, query: &str) -> Result<String, AssistantError> {
        let nodes = self.context_nodes(query);
        self.synthesizer.synthesize(query, &nodes).await
    }
}

/// Builds the code assistant tool over the shared LLM handle.
pub fn load_code_tool(llm: Arc<dyn LLM>) -> QueryTool {
    QueryTool::new(
        CODE_TOOL_NAME,
        CODE_TOOL_DESCRIPTION,
        Arc::new(CodeQueryEngine::new(llm)),
    )
}
