//! Core library for the Lectern research assistant service.
//!
//! This crate wires hosted language model providers to a small agent chat
//! surface and a set of query tools. The architecture keeps the moving parts
//! deliberately thin:
//!
//! - **Model selection**: a closed provider enum mapped to concrete HTTP
//!   clients, constructed once at startup
//! - **Chat surface**: blocking and streaming entry points over a single
//!   shared LLM handle
//! - **Tool ecosystem**: query tools (paper search, document search, code
//!   assistant) registered with the agent runner
//! - **Prediction envelope**: a tagged streaming/complete response handed to
//!   the transport layer

pub mod agent;
pub mod config;
pub mod core_types;
pub mod errors;
pub mod llm;
pub mod prompts;
pub mod service;
pub mod tools;

pub use agent::{AgentRunner, ChatEngine};
pub use config::{Service, ServiceConfig};
pub use errors::AssistantError;
pub use llm::LLM;
pub use service::{AssistantService, Prediction};

#[cfg(test)]
pub mod test_utils;
