//! LLM provider implementations
//!
//! This module contains provider-specific implementations for the supported
//! LLM services. Each provider implements the common LLM trait while handling
//! provider-specific protocols and authentication. Exactly one client is
//! constructed per process, at startup; an unrecognized service never reaches
//! this module because the service enum is closed.

use crate::config::{Service, ServiceConfig};
use crate::errors::AssistantError;
use crate::llm::LLM;
use std::sync::Arc;

pub mod gemini;
pub mod groq;
pub mod ollama;
pub mod openai;

/// Create an LLM client based on the service configuration.
///
/// Construction either succeeds or the failure propagates to the caller and
/// startup aborts. There is no retry and no fallback provider.
pub fn create_llm_client(config: &ServiceConfig) -> Result<Arc<dyn LLM>, AssistantError> {
    log::info!("Loading model: {}", config.model_id);
    log::info!("This action can take a few minutes!");

    match config.service {
        Service::Ollama => ollama::create_client(config),
        Service::OpenAI => openai::create_client(config),
        Service::Groq => groq::create_client(config),
        Service::Gemini => gemini::create_client(config),
    }
}

/// Reads a provider API key from the environment.
pub(crate) fn require_api_key(env_var: &str) -> Result<String, AssistantError> {
    std::env::var(env_var).map_err(|_| {
        AssistantError::Auth(format!(
            "No API key found for the selected service. Set {}",
            env_var
        ))
    })
}
