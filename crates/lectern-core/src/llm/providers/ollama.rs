//! Ollama client for locally hosted models
//!
//! Talks to an Ollama daemon over its `/api/chat` endpoint. No API key is
//! involved. Streaming responses arrive as newline-delimited JSON objects,
//! the last of which carries `done: true`.

use crate::config::ServiceConfig;
use crate::core_types::{ChunkStream, LLMResponse, Message, Role};
use crate::errors::AssistantError;
use crate::llm::stream::LineBuffer;
use crate::llm::LLM;
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";

#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    pub(crate) base_url: String,
    pub(crate) model: String,
    pub(crate) temperature: Option<f32>,
}

impl OllamaClient {
    pub fn new(model: String) -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_OLLAMA_HOST.to_string(),
            model,
            temperature: None,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    fn build_request_body(&self, messages: &[Message], stream: bool) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": messages
                .iter()
                .map(|msg| json!({
                    "role": format_role(&msg.role),
                    "content": msg.content,
                }))
                .collect::<Vec<_>>(),
            "stream": stream,
        });

        if let Some(temp) = self.temperature {
            body["options"] = json!({ "temperature": temp });
        }

        body
    }

    async fn post_chat(&self, body: &Value) -> Result<reqwest::Response, AssistantError> {
        let request_url = format!("{}/api/chat", self.base_url);
        log::debug!("OllamaClient request to {}", request_url);

        let response = self.client.post(&request_url).json(body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error while reading error response body".to_string());
            return Err(AssistantError::Llm(format!(
                "Ollama API request failed with status {}: {}",
                status, error_text
            )));
        }

        Ok(response)
    }
}

fn format_role(role: &Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaChatResponse {
    message: Option<OllamaMessage>,
    done: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    content: String,
}

#[async_trait]
impl LLM for OllamaClient {
    async fn generate(&self, messages: Vec<Message>) -> Result<LLMResponse, AssistantError> {
        let body = self.build_request_body(&messages, false);
        let response = self.post_chat(&body).await?;

        let parsed: OllamaChatResponse = response.json().await.map_err(|e| {
            AssistantError::Parsing(format!("Failed to parse Ollama response JSON: {}", e))
        })?;

        Ok(LLMResponse {
            content: parsed.message.map(|m| m.content),
            finish_reason: parsed.done.then(|| "stop".to_string()),
            usage: None,
        })
    }

    async fn stream_generate(&self, messages: Vec<Message>) -> Result<ChunkStream, AssistantError> {
        let body = self.build_request_body(&messages, true);
        let response = self.post_chat(&body).await?;
        let mut bytes = response.bytes_stream();

        let stream = async_stream::stream! {
            let mut buffer = LineBuffer::new();
            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(AssistantError::Stream(e.to_string()));
                        return;
                    }
                };
                for line in buffer.push(&chunk) {
                    if line.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<OllamaChatResponse>(&line) {
                        Ok(parsed) => {
                            if let Some(message) = parsed.message {
                                if !message.content.is_empty() {
                                    yield Ok(message.content);
                                }
                            }
                            if parsed.done {
                                return;
                            }
                        }
                        Err(e) => {
                            yield Err(AssistantError::Parsing(format!(
                                "Malformed stream chunk: {}",
                                e
                            )));
                            return;
                        }
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

pub(crate) fn client_from_config(config: &ServiceConfig) -> Result<OllamaClient, AssistantError> {
    log::info!("Loading Ollama model: {}", config.model_id);

    let mut client =
        OllamaClient::new(config.model_id.clone()).with_temperature(config.temperature);
    if let Ok(host) = std::env::var("OLLAMA_HOST") {
        client = client.with_base_url(host);
    }

    Ok(client)
}

/// Create an Ollama LLM client from configuration. No API key is required.
pub fn create_client(config: &ServiceConfig) -> Result<Arc<dyn LLM>, AssistantError> {
    Ok(Arc::new(client_from_config(config)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_client_creation() {
        let client = OllamaClient::new("llama3".to_string()).with_temperature(0.7);
        assert_eq!(client.base_url, DEFAULT_OLLAMA_HOST);
        assert_eq!(client.model, "llama3");
        assert_eq!(client.temperature, Some(0.7));
    }

    #[test]
    fn test_request_body_shape() {
        let client = OllamaClient::new("llama3".to_string()).with_temperature(0.25);
        let body = client.build_request_body(&[Message::user("hi")], true);

        assert_eq!(body["model"], "llama3");
        assert_eq!(body["stream"], true);
        assert_eq!(body["options"]["temperature"], 0.25);
        assert_eq!(body["messages"][0]["role"], "user");
    }

    #[test]
    fn test_stream_line_parsing() {
        let line = r#"{"message": {"content": "chunk"}, "done": false}"#;
        let parsed: OllamaChatResponse = serde_json::from_str(line).unwrap();
        assert_eq!(parsed.message.unwrap().content, "chunk");
        assert!(!parsed.done);

        let terminal = r#"{"message": {"content": ""}, "done": true}"#;
        let parsed: OllamaChatResponse = serde_json::from_str(terminal).unwrap();
        assert!(parsed.done);
    }
}
