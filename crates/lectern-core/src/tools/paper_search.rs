//! Paper search tool
//!
//! Retrieves candidate papers from the Semantic Scholar search API and
//! synthesizes an answer over their titles and abstracts.

use crate::errors::AssistantError;
use crate::llm::LLM;
use crate::prompts::QA_PROMPT;
use crate::tools::{
    PromptTemplate, QueryTool, ResponseSynthesizer, Retriever, RetrieverQueryEngine, SourceNode,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;

pub const PAPER_SEARCH_TOOL_NAME: &str = "paper_search_tool";
pub const PAPER_SEARCH_TOOL_DESCRIPTION: &str =
    "Useful for searching scientific papers and answering questions about published research";

const DEFAULT_API_BASE: &str = "https://api.semanticscholar.org/graph/v1";
const DEFAULT_LIMIT: usize = 5;

pub struct SemanticScholarRetriever {
    client: Client,
    api_base: String,
    limit: usize,
}

impl SemanticScholarRetriever {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_api_base(mut self, api_base: String) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

impl Default for SemanticScholarRetriever {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct PaperSearchResponse {
    #[serde(default)]
    data: Vec<PaperRecord>,
}

#[derive(Debug, Deserialize)]
struct PaperRecord {
    title: Option<String>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    url: Option<String>,
}

impl PaperRecord {
    fn into_node(self) -> SourceNode {
        let mut text = format!("Title: {}", self.title.unwrap_or_default());
        if let Some(abstract_text) = self.abstract_text {
            text.push('\n');
            text.push_str(&abstract_text);
        }
        if let Some(url) = self.url {
            text.push_str("\nSource: ");
            text.push_str(&url);
        }
        SourceNode::new(text)
    }
}

#[async_trait]
impl Retriever for SemanticScholarRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<SourceNode>, AssistantError> {
        let request_url = format!("{}/paper/search", self.api_base);
        log::info!("Paper search: '{}'", query);

        let limit = self.limit.to_string();
        let response = self
            .client
            .get(&request_url)
            .query(&[
                ("query", query),
                ("limit", limit.as_str()),
                ("fields", "title,abstract,url"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AssistantError::Tool {
                tool_name: PAPER_SEARCH_TOOL_NAME.to_string(),
                message: format!("Paper search request failed with status {}", status),
            });
        }

        let parsed: PaperSearchResponse = response.json().await.map_err(|e| {
            AssistantError::Parsing(format!("Failed to parse paper search response: {}", e))
        })?;

        Ok(parsed.data.into_iter().map(PaperRecord::into_node).collect())
    }
}

/// Builds the paper search tool over the shared LLM handle.
pub fn load_paper_search_tool(llm: Arc<dyn LLM>) -> QueryTool {
    let engine = RetrieverQueryEngine::new(
        Arc::new(SemanticScholarRetriever::new()),
        ResponseSynthesizer::new(llm, PromptTemplate::new(QA_PROMPT)),
    );
    QueryTool::new(
        PAPER_SEARCH_TOOL_NAME,
        PAPER_SEARCH_TOOL_DESCRIPTION,
        Arc::new(engine),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockLLM;

    #[test]
    fn test_paper_record_formatting() {
        let raw = r#"{
            "data": [
                {
                    "title": "Attention Is All You Need",
                    "abstract": "We propose the Transformer.",
                    "url": "https://example.org/transformer"
                },
                {"title": "Untitled follow-up"}
            ]
        }"#;
        let parsed: PaperSearchResponse = serde_json::from_str(raw).unwrap();
        let nodes: Vec<SourceNode> = parsed.data.into_iter().map(PaperRecord::into_node).collect();

        assert_eq!(nodes.len(), 2);
        assert!(nodes[0].text.starts_with("Title: Attention Is All You Need"));
        assert!(nodes[0].text.contains("We propose the Transformer."));
        assert!(nodes[0].text.ends_with("Source: https://example.org/transformer"));
        assert_eq!(nodes[1].text, "Title: Untitled follow-up");
    }

    #[test]
    fn test_empty_response_parses() {
        let parsed: PaperSearchResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.data.is_empty());
    }

    #[test]
    fn test_retriever_builder() {
        let retriever = SemanticScholarRetriever::new()
            .with_api_base("http://localhost:9999/".to_string())
            .with_limit(3);
        assert_eq!(retriever.api_base, "http://localhost:9999");
        assert_eq!(retriever.limit, 3);
    }

    #[tokio::test]
    async fn test_loaded_tool_descriptor() {
        let tool = load_paper_search_tool(Arc::new(MockLLM::completing("x")));
        assert_eq!(tool.name(), "paper_search_tool");
        assert_eq!(tool.description(), PAPER_SEARCH_TOOL_DESCRIPTION);
    }
}
