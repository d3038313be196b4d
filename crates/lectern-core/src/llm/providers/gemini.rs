//! Google Gemini API client implementation
//!
//! Native client for Google's Generative AI API. Blocking requests use
//! `generateContent`; streaming uses `streamGenerateContent` with SSE
//! framing, where every event carries a partial candidate.

use crate::config::ServiceConfig;
use crate::core_types::{ChunkStream, LLMResponse, Message, Role};
use crate::errors::AssistantError;
use crate::llm::stream::{sse_data, LineBuffer};
use crate::llm::LLM;
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct GeminiClient {
    pub(crate) api_key: String,
    pub(crate) model: String,
    client: Client,
    pub(crate) base_url: String,
    pub(crate) temperature: Option<f32>,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            client: Client::new(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
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

    fn build_request(&self, messages: &[Message]) -> GeminiRequest {
        let mut system_parts = Vec::new();
        let mut contents = Vec::new();

        for msg in messages {
            match msg.role {
                Role::System => system_parts.push(GeminiPart {
                    text: msg.content.clone(),
                }),
                Role::User => contents.push(GeminiContent {
                    role: Some("user".to_string()),
                    parts: vec![GeminiPart {
                        text: msg.content.clone(),
                    }],
                }),
                Role::Assistant => contents.push(GeminiContent {
                    role: Some("model".to_string()),
                    parts: vec![GeminiPart {
                        text: msg.content.clone(),
                    }],
                }),
            }
        }

        GeminiRequest {
            contents,
            generation_config: self.temperature.map(|temperature| GeminiGenerationConfig {
                temperature,
            }),
            system_instruction: if system_parts.is_empty() {
                None
            } else {
                Some(GeminiContent {
                    role: None,
                    parts: system_parts,
                })
            },
        }
    }

    async fn post(&self, method: &str, body: &GeminiRequest) -> Result<reqwest::Response, AssistantError> {
        let request_url = format!("{}/models/{}:{}", self.base_url, self.model, method);
        log::debug!("GeminiClient request to {}", request_url);

        let response = self
            .client
            .post(&request_url)
            .header("x-goog-api-key", &self.api_key)
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
                "Gemini API request failed with status {}: {}",
                status, error_text
            )));
        }

        Ok(response)
    }
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

fn extract_text(response: GeminiResponse) -> (Option<String>, Option<String>) {
    let Some(candidate) = response.candidates.and_then(|c| c.into_iter().next()) else {
        return (None, None);
    };

    let text = candidate.content.map(|content| {
        content
            .parts
            .into_iter()
            .map(|part| part.text)
            .collect::<Vec<_>>()
            .join("")
    });

    (text, candidate.finish_reason)
}

#[async_trait]
impl LLM for GeminiClient {
    async fn generate(&self, messages: Vec<Message>) -> Result<LLMResponse, AssistantError> {
        let body = self.build_request(&messages);
        let response = self.post("generateContent", &body).await?;

        let parsed: GeminiResponse = response.json().await.map_err(|e| {
            AssistantError::Parsing(format!("Failed to parse Gemini response JSON: {}", e))
        })?;

        let (content, finish_reason) = extract_text(parsed);
        Ok(LLMResponse {
            content,
            finish_reason,
            usage: None,
        })
    }

    async fn stream_generate(&self, messages: Vec<Message>) -> Result<ChunkStream, AssistantError> {
        let body = self.build_request(&messages);
        let response = self.post("streamGenerateContent?alt=sse", &body).await?;
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
                    match serde_json::from_str::<GeminiResponse>(payload) {
                        Ok(parsed) => {
                            if let (Some(text), _) = extract_text(parsed) {
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

pub(crate) fn client_from_config(config: &ServiceConfig) -> Result<GeminiClient, AssistantError> {
    let api_key = super::require_api_key("GOOGLE_API_KEY")?;
    log::info!("Loading Gemini model: {}", config.model_id);

    Ok(GeminiClient::new(api_key, config.model_id.clone()).with_temperature(config.temperature))
}

/// Create a Gemini LLM client from configuration.
pub fn create_client(config: &ServiceConfig) -> Result<Arc<dyn LLM>, AssistantError> {
    Ok(Arc::new(client_from_config(config)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_gemini_client_creation() {
        let client = GeminiClient::new("gk-test".to_string(), "gemini-2.0-flash".to_string())
            .with_temperature(0.8);

        assert!(client.base_url.contains("generativelanguage.googleapis.com"));
        assert_eq!(client.model, "gemini-2.0-flash");
        assert_eq!(client.temperature, Some(0.8));
    }

    #[test]
    fn test_system_messages_become_system_instruction() {
        let client = GeminiClient::new("gk-test".to_string(), "gemini-2.0-flash".to_string());
        let request = client.build_request(&[
            Message::system("Be terse."),
            Message::user("Hi"),
            Message::assistant("Hello"),
        ]);

        let instruction = request.system_instruction.unwrap();
        assert_eq!(instruction.parts[0].text, "Be terse.");
        assert_eq!(request.contents.len(), 2);
        assert_eq!(request.contents[0].role.as_deref(), Some("user"));
        assert_eq!(request.contents[1].role.as_deref(), Some("model"));
    }

    #[test]
    fn test_response_text_extraction() {
        let raw = r#"{
            "candidates": [
                {
                    "content": {"role": "model", "parts": [{"text": "Hel"}, {"text": "lo"}]},
                    "finishReason": "STOP"
                }
            ]
        }"#;
        let parsed: GeminiResponse = serde_json::from_str(raw).unwrap();
        let (text, finish_reason) = extract_text(parsed);
        assert_eq!(text.as_deref(), Some("Hello"));
        assert_eq!(finish_reason.as_deref(), Some("STOP"));
    }

    #[test]
    fn test_empty_candidates_yield_no_text() {
        let parsed: GeminiResponse = serde_json::from_str("{}").unwrap();
        let (text, _) = extract_text(parsed);
        assert!(text.is_none());
    }

    #[test]
    #[serial]
    fn test_client_from_config_reads_env_key() {
        std::env::set_var("GOOGLE_API_KEY", "gk-abc");
        let config = ServiceConfig {
            service: crate::config::Service::Gemini,
            model_id: "gemini-2.0-flash".to_string(),
            temperature: 0.1,
            ..ServiceConfig::default()
        };

        let client = client_from_config(&config).unwrap();
        assert_eq!(client.api_key, "gk-abc");
        assert_eq!(client.temperature, Some(0.1));
        std::env::remove_var("GOOGLE_API_KEY");
    }
}
