pub mod claude;
pub mod gemini;
pub mod openai;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub provider: String,
}

/// One combined prompt for one model. Every provider sends it as a single user turn.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatRequest {
    pub prompt: String,
    pub model: String,
}

/// A text-generation endpoint: one combined prompt in, completion text out.
#[async_trait]
pub trait Generate: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Builds a generator for a model string such as `gemini/gemini-2.5-flash`.
pub trait Connect: Send + Sync {
    fn connect(&self, model: &str, api_key: Option<&str>) -> Result<Arc<dyn Generate>, LlmError>;
}

/// Unified LLM provider enum — dispatches to OpenAI-compatible, Claude or Gemini backends.
#[derive(Debug, Clone)]
pub enum Provider {
    OpenAi(openai::OpenAiConfig),
    Claude(claude::ClaudeConfig),
    Gemini(gemini::GeminiConfig),
    Ollama(openai::OpenAiConfig),
}

impl Provider {
    pub fn openai(api_key: String) -> Self {
        Provider::OpenAi(openai::OpenAiConfig {
            api_key,
            base_url: "https://api.openai.com/v1".to_string(),
        })
    }

    pub fn claude(api_key: String) -> Self {
        Provider::Claude(claude::ClaudeConfig {
            api_key,
            base_url: "https://api.anthropic.com".to_string(),
        })
    }

    pub fn gemini(api_key: String) -> Self {
        Provider::Gemini(gemini::GeminiConfig {
            api_key,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        })
    }

    pub fn ollama(host: String) -> Self {
        Provider::Ollama(openai::OpenAiConfig {
            api_key: String::new(),
            base_url: format!("{}/v1", host.trim_end_matches('/')),
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAi(_) => "openai",
            Provider::Claude(_) => "claude",
            Provider::Gemini(_) => "gemini",
            Provider::Ollama(_) => "ollama",
        }
    }

    pub async fn chat(
        &self,
        client: &Client,
        request: &ChatRequest,
    ) -> Result<String, LlmError> {
        match self {
            Provider::OpenAi(config) | Provider::Ollama(config) => {
                openai::chat(client, config, request).await
            }
            Provider::Claude(config) => claude::chat(client, config, request).await,
            Provider::Gemini(config) => gemini::chat(client, config, request).await,
        }
    }
}

/// A provider bound to one model id and a shared HTTP client.
#[derive(Debug, Clone)]
pub struct ModelClient {
    provider: Provider,
    model: String,
    http: Client,
}

impl ModelClient {
    pub fn new(
        provider: Provider,
        model: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, LlmError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            provider,
            model: model.into(),
            http: builder.build()?,
        })
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Generate for ModelClient {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let request = ChatRequest {
            prompt: prompt.to_string(),
            model: self.model.clone(),
        };
        self.provider.chat(&self.http, &request).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Response blocked: {0}")]
    Blocked(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Serialize for LlmError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Turn a non-2xx response into `LlmError::Api`, keeping the body as the message.
pub(crate) async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, LlmError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let message = resp.text().await.unwrap_or_default();
    Err(LlmError::Api { status, message })
}
