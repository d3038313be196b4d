//! Service configuration types and environment loading
//!
//! Configuration is immutable after process start. The provider is a closed
//! enum so that "unsupported service" is a parse-time failure rather than a
//! runtime branch; API keys are intentionally not part of the configuration
//! and are read from the environment by the selected provider constructor.

use crate::errors::AssistantError;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Supported LLM services.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    Ollama,
    OpenAI,
    Groq,
    Gemini,
}

impl FromStr for Service {
    type Err = AssistantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ollama" => Ok(Service::Ollama),
            "openai" => Ok(Service::OpenAI),
            "groq" => Ok(Service::Groq),
            "gemini" => Ok(Service::Gemini),
            other => Err(AssistantError::UnsupportedService(other.to_string())),
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Service::Ollama => "ollama",
            Service::OpenAI => "openai",
            Service::Groq => "groq",
            Service::Gemini => "gemini",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_service")]
    pub service: Service,
    #[serde(default = "default_model_id")]
    pub model_id: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub stream: bool,
    #[serde(default = "default_docs_dir")]
    pub docs_dir: PathBuf,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            service: default_service(),
            model_id: default_model_id(),
            temperature: default_temperature(),
            stream: false,
            docs_dir: default_docs_dir(),
        }
    }
}

impl ServiceConfig {
    /// Loads the configuration from the process environment.
    ///
    /// Recognized variables: `SERVICE`, `MODEL_ID`, `TEMPERATURE`, `STREAM`,
    /// `DOCS_DIR`. Unset variables fall back to defaults; malformed values
    /// are configuration errors, and an unrecognized `SERVICE` is fatal.
    pub fn from_env() -> Result<Self, AssistantError> {
        let mut config = ServiceConfig::default();

        if let Ok(service) = env::var("SERVICE") {
            config.service = service.parse()?;
        }
        if let Ok(model_id) = env::var("MODEL_ID") {
            config.model_id = model_id;
        }
        if let Ok(temperature) = env::var("TEMPERATURE") {
            config.temperature = temperature.parse().map_err(|_| {
                AssistantError::Config(format!("Invalid TEMPERATURE value: '{}'", temperature))
            })?;
        }
        if let Ok(stream) = env::var("STREAM") {
            config.stream = parse_bool(&stream).ok_or_else(|| {
                AssistantError::Config(format!("Invalid STREAM value: '{}'", stream))
            })?;
        }
        if let Ok(docs_dir) = env::var("DOCS_DIR") {
            config.docs_dir = PathBuf::from(docs_dir);
        }

        Ok(config)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn default_service() -> Service {
    Service::Ollama
}

fn default_model_id() -> String {
    "llama3".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_docs_dir() -> PathBuf {
    PathBuf::from("docs")
}
