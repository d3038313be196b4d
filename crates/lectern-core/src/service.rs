//! Assistant service: model selection, tool wiring, and prediction
//!
//! The service is constructed once at process start and never mutated
//! afterwards. Construction selects the LLM client, loads the tool set, and
//! builds the agent runner; any failure aborts startup. At request time,
//! `predict` forwards the prompt to the agent in either streaming or blocking
//! mode, decided by the process-wide stream flag.

use crate::agent::{AgentRunner, ChatEngine};
use crate::config::ServiceConfig;
use crate::core_types::ChunkStream;
use crate::errors::AssistantError;
use crate::llm::providers;
use crate::prompts::SYSTEM_PROMPT;
use crate::tools::code_tool::load_code_tool;
use crate::tools::document_search::load_document_search_tool;
use crate::tools::paper_search::load_paper_search_tool;
use crate::tools::{ToolInfo, ToolRegistry};
use futures_util::StreamExt;
use std::sync::Arc;

/// Media type of every prediction body, streamed or complete.
pub const PREDICTION_MEDIA_TYPE: &str = "text/plain; charset=utf-8";

/// Outcome of a predict call. Callers must handle both arms explicitly.
pub enum Prediction {
    /// Lazy sequence of text chunks, forwarded as the agent produces them.
    Streaming(ChunkStream),
    /// Fully materialized response text.
    Complete(String),
}

impl Prediction {
    pub fn media_type(&self) -> &'static str {
        PREDICTION_MEDIA_TYPE
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self, Prediction::Streaming(_))
    }

    /// Drains the prediction into a single string. The streaming arm is
    /// concatenated in arrival order.
    pub async fn into_text(self) -> Result<String, AssistantError> {
        match self {
            Prediction::Complete(text) => Ok(text),
            Prediction::Streaming(mut stream) => {
                let mut text = String::new();
                while let Some(chunk) = stream.next().await {
                    text.push_str(&chunk?);
                }
                Ok(text)
            }
        }
    }
}

pub struct AssistantService {
    engine: Arc<dyn ChatEngine>,
    registry: Arc<ToolRegistry>,
    stream: bool,
}

impl AssistantService {
    /// Builds the service from configuration: one LLM handle, the static
    /// tool set, and the agent runner. Fails permanently on an unsupported
    /// service or a missing credential.
    pub fn new(config: &ServiceConfig) -> Result<Self, AssistantError> {
        let llm = providers::create_llm_client(config)?;

        let paper_search = Arc::new(load_paper_search_tool(llm.clone()));
        let document_search = Arc::new(load_document_search_tool(llm.clone(), &config.docs_dir)?);
        let code = Arc::new(load_code_tool(llm.clone()));

        let mut registry = ToolRegistry::new();
        registry.register_tool(paper_search.clone());
        registry.register_tool(document_search.clone());
        registry.register_tool(code);

        // The code tool is listed for discovery but not handed to the runner.
        let engine = AgentRunner::from_llm(
            llm,
            vec![document_search, paper_search],
            SYSTEM_PROMPT,
        );

        Ok(Self {
            engine: Arc::new(engine),
            registry: Arc::new(registry),
            stream: config.stream,
        })
    }

    /// Builds a service around an existing chat engine. Used by transports
    /// and tests that supply their own engine.
    pub fn with_engine(engine: Arc<dyn ChatEngine>, stream: bool) -> Self {
        Self {
            engine,
            registry: Arc::new(ToolRegistry::new()),
            stream,
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.stream
    }

    pub fn tools(&self) -> Vec<ToolInfo> {
        self.registry.list_tools()
    }

    /// Forwards the prompt to the agent. The response mode follows the
    /// process-wide stream flag, not the request. Agent errors propagate
    /// unmodified.
    pub async fn predict(&self, prompt: &str) -> Result<Prediction, AssistantError> {
        if self.stream {
            let streaming = self.engine.stream_chat(prompt).await?;
            Ok(Prediction::Streaming(streaming.response_gen))
        } else {
            let response = self.engine.chat(prompt).await?;
            Ok(Prediction::Complete(response.response))
        }
    }
}
