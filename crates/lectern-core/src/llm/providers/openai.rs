//! OpenAI chat-completions client
//!
//! Speaks the `/chat/completions` protocol in both blocking and streaming
//! form. The streaming path parses server-sent events and forwards content
//! deltas as they arrive. The same client also serves OpenAI-compatible
//! endpoints through a custom API base (see the Groq wrapper).

use crate::config::ServiceConfig;
use crate::core_types::{ChunkStream, LLMResponse, Message, Role, Usage};
use crate::errors::AssistantError;
use crate::llm::stream::{sse_data, LineBuffer, SSE_DONE};
use crate::llm::LLM;
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct OpenAIClient {
    client: Client,
    pub(crate) api_key: String,
    pub(crate) api_base: String,
    pub(crate) model: String,
    pub(crate) temperature: Option<f32>,
}

impl OpenAIClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            api_base: "https://api.openai.com/v1".to_string(),
            model,
            temperature: None,
        }
    }

    pub fn with_api_base(mut self, api_base: String) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    fn build_request_body(&self, messages: &[Message], stream: bool) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": self.format_messages(messages),
        });

        if let Some(temp) = self.temperature {
            body["temperature"] = temp.into();
        }
        if stream {
            body["stream"] = true.into();
        }

        body
    }

    fn format_messages(&self, messages: &[Message]) -> Vec<Value> {
        messages
            .iter()
            .map(|msg| {
                json!({
                    "role": format_role(&msg.role),
                    "content": msg.content,
                })
            })
            .collect()
    }

    async fn post_completions(&self, body: &Value) -> Result<reqwest::Response, AssistantError> {
        let request_url = format!("{}/chat/completions", self.api_base);
        log::debug!("OpenAIClient request to {}", request_url);

        let response = self
            .client
            .post(&request_url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error while reading error response body".to_string());
            return Err(AssistantError::Llm(format!(
                "LLM API request failed with status {}: {}",
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

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    usage: Option<UsageWire>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageWire,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatMessageWire {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageWire {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

#[async_trait]
impl LLM for OpenAIClient {
    async fn generate(&self, messages: Vec<Message>) -> Result<LLMResponse, AssistantError> {
        let body = self.build_request_body(&messages, false);
        let response = self.post_completions(&body).await?;

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AssistantError::Parsing(format!("Failed to parse LLM response JSON: {}", e)))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AssistantError::Llm("LLM response contained no choices".to_string()))?;

        Ok(LLMResponse {
            content: choice.message.content,
            finish_reason: choice.finish_reason,
            usage: parsed.usage.map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
        })
    }

    async fn stream_generate(&self, messages: Vec<Message>) -> Result<ChunkStream, AssistantError> {
        let body = self.build_request_body(&messages, true);
        let response = self.post_completions(&body).await?;
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
                    let Some(payload) = sse_data(&line) else { continue };
                    if payload == SSE_DONE {
                        return;
                    }
                    match serde_json::from_str::<StreamChunk>(payload) {
                        Ok(parsed) => {
                            let delta = parsed
                                .choices
                                .into_iter()
                                .next()
                                .and_then(|c| c.delta.content);
                            if let Some(text) = delta {
                                if !text.is_empty() {
                                    yield Ok(text);
                                }
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

pub(crate) fn client_from_config(config: &ServiceConfig) -> Result<OpenAIClient, AssistantError> {
    let api_key = super::require_api_key("OPENAI_API_KEY")?;
    log::info!("Loading OpenAI model: {}", config.model_id);

    Ok(OpenAIClient::new(api_key, config.model_id.clone()).with_temperature(config.temperature))
}

/// Create an OpenAI LLM client from configuration.
pub fn create_client(config: &ServiceConfig) -> Result<Arc<dyn LLM>, AssistantError> {
    Ok(Arc::new(client_from_config(config)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_openai_client_creation() {
        let client = OpenAIClient::new("test-key".to_string(), "gpt-4o-mini".to_string())
            .with_temperature(0.7);

        assert_eq!(client.api_key, "test-key");
        assert_eq!(client.model, "gpt-4o-mini");
        assert_eq!(client.temperature, Some(0.7));
        assert_eq!(client.api_base, "https://api.openai.com/v1");
    }

    #[test]
    fn test_request_body_carries_model_and_temperature() {
        let client = OpenAIClient::new("test-key".to_string(), "gpt-4o-mini".to_string())
            .with_temperature(0.5);

        let messages = vec![
            Message::system("You are a helpful assistant."),
            Message::user("Hello!"),
        ];
        let body = client.build_request_body(&messages, false);

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["temperature"], 0.5);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "Hello!");
        assert!(body.get("stream").is_none());
    }

    #[test]
    fn test_streaming_request_body_sets_stream_flag() {
        let client = OpenAIClient::new("test-key".to_string(), "gpt-4o-mini".to_string());
        let body = client.build_request_body(&[Message::user("hi")], true);
        assert_eq!(body["stream"], true);
    }

    #[test]
    fn test_completion_response_parsing() {
        let raw = r#"{
            "choices": [
                {"message": {"content": "hello there"}, "finish_reason": "stop"}
            ],
            "usage": {"prompt_tokens": 5, "completion_tokens": 3, "total_tokens": 8}
        }"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("hello there"));
        assert_eq!(parsed.usage.as_ref().unwrap().total_tokens, 8);
    }

    #[test]
    fn test_stream_chunk_parsing() {
        let raw = r#"{"choices": [{"delta": {"content": "wor"}}]}"#;
        let parsed: StreamChunk = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].delta.content.as_deref(), Some("wor"));
    }

    #[test]
    #[serial]
    fn test_client_from_config_reads_env_key() {
        std::env::set_var("OPENAI_API_KEY", "abc");
        let config = ServiceConfig {
            service: crate::config::Service::OpenAI,
            model_id: "gpt-4o-mini".to_string(),
            temperature: 0.5,
            ..ServiceConfig::default()
        };

        let client = client_from_config(&config).unwrap();
        assert_eq!(client.api_key, "abc");
        assert_eq!(client.model, "gpt-4o-mini");
        assert_eq!(client.temperature, Some(0.5));
        std::env::remove_var("OPENAI_API_KEY");
    }
}
