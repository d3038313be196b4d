//! Error types for failure handling across the assistant service
//!
//! This module provides a unified error hierarchy covering model selection,
//! provider communication, tool execution, and configuration. Failures are
//! either fatal at startup (service selection, client construction) or
//! surfaced verbatim at request time (generation); no layer performs local
//! recovery.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum AssistantError {
    #[error("Unsupported service '{0}': the implementation for other types of LLMs is not ready yet")]
    UnsupportedService(String),
    #[error("Authentication error: {0}")]
    Auth(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("LLM interaction failed: {0}")]
    Llm(String),
    #[error("Parsing error: {0}")]
    Parsing(String),
    #[error("Stream error: {0}")]
    Stream(String),
    #[error("Tool execution failed for '{tool_name}': {message}")]
    Tool { tool_name: String, message: String },
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for AssistantError {
    fn from(err: std::io::Error) -> Self {
        AssistantError::Io(err.to_string())
    }
}

impl From<reqwest::Error> for AssistantError {
    fn from(err: reqwest::Error) -> Self {
        AssistantError::Llm(err.to_string())
    }
}
