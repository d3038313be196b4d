//! Core type definitions shared between the agent surface and LLM clients
//!
//! These types form the contract between the chat surface and the provider
//! clients. The message shape follows the OpenAI chat format, which the
//! other providers translate into their own wire representations.

use crate::errors::AssistantError;
use futures_util::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LLMResponse {
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl LLMResponse {
    pub fn from_text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            finish_reason: None,
            usage: None,
        }
    }
}

/// Lazy sequence of text chunks produced by a streaming generation.
///
/// Chunks are forwarded in arrival order; adapters over this type must not
/// buffer, reorder, or batch.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String, AssistantError>> + Send>>;
