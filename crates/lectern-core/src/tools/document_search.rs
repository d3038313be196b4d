//! Document search tool
//!
//! Retrieves context from a local directory of plain-text and markdown
//! documents using token-overlap scoring, then synthesizes an answer over
//! the best matches. Documents are loaded once at startup and shared
//! read-only afterwards.

use crate::errors::AssistantError;
use crate::llm::LLM;
use crate::prompts::QA_PROMPT;
use crate::tools::{
    PromptTemplate, QueryTool, ResponseSynthesizer, Retriever, RetrieverQueryEngine, SourceNode,
};
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

pub const DOCUMENT_SEARCH_TOOL_NAME: &str = "document_search_tool";
pub const DOCUMENT_SEARCH_TOOL_DESCRIPTION: &str =
    "Useful for answering questions from the local document collection";

const DEFAULT_TOP_K: usize = 3;

#[derive(Debug, Clone)]
struct Document {
    source: String,
    text: String,
}

pub struct DirectoryRetriever {
    documents: Vec<Document>,
    top_k: usize,
}

impl DirectoryRetriever {
    /// Loads every `.txt` and `.md` file directly under `root`. A missing
    /// directory yields an empty collection rather than an error so the
    /// service can start without local documents.
    pub fn load(root: &Path) -> Result<Self, AssistantError> {
        let mut documents = Vec::new();

        if root.is_dir() {
            for entry in std::fs::read_dir(root)? {
                let path = entry?.path();
                let is_text = matches!(
                    path.extension().and_then(|e| e.to_str()),
                    Some("txt") | Some("md")
                );
                if !path.is_file() || !is_text {
                    continue;
                }
                let text = std::fs::read_to_string(&path)?;
                documents.push(Document {
                    source: path.display().to_string(),
                    text,
                });
            }
            log::info!("Loaded {} documents from {}", documents.len(), root.display());
        } else {
            log::warn!(
                "Document directory {} does not exist; document search will return no context",
                root.display()
            );
        }

        Ok(Self {
            documents,
            top_k: DEFAULT_TOP_K,
        })
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    fn score(query_terms: &HashSet<String>, text: &str) -> f32 {
        if query_terms.is_empty() {
            return 0.0;
        }
        let document_terms: HashSet<String> = tokenize(text).collect();
        let overlap = query_terms.intersection(&document_terms).count();
        overlap as f32 / query_terms.len() as f32
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.len() > 2)
        .map(|token| token.to_ascii_lowercase())
}

#[async_trait]
impl Retriever for DirectoryRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<SourceNode>, AssistantError> {
        let query_terms: HashSet<String> = tokenize(query).collect();

        let mut scored: Vec<(f32, &Document)> = self
            .documents
            .iter()
            .map(|doc| (Self::score(&query_terms, &doc.text), doc))
            .filter(|(score, _)| *score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(self.top_k)
            .map(|(score, doc)| {
                SourceNode::new(format!("[{}]\n{}", doc.source, doc.text)).with_score(score)
            })
            .collect())
    }
}

/// Builds the document search tool over the shared LLM handle.
pub fn load_document_search_tool(
    llm: Arc<dyn LLM>,
    docs_dir: &Path,
) -> Result<QueryTool, AssistantError> {
    let retriever = DirectoryRetriever::load(docs_dir)?;
    let engine = RetrieverQueryEngine::new(
        Arc::new(retriever),
        ResponseSynthesizer::new(llm, PromptTemplate::new(QA_PROMPT)),
    );
    Ok(QueryTool::new(
        DOCUMENT_SEARCH_TOOL_NAME,
        DOCUMENT_SEARCH_TOOL_DESCRIPTION,
        Arc::new(engine),
    ))
}
