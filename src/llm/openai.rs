use super::{check_status, ChatRequest, LlmError};
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
}

#[derive(Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiRequestMessage>,
    stream: bool,
}

#[derive(Serialize)]
struct OpenAiRequestMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    // `null` when the model refused or the output was filtered.
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

fn build_request(request: &ChatRequest) -> OpenAiRequest {
    OpenAiRequest {
        model: request.model.clone(),
        messages: vec![OpenAiRequestMessage {
            role: "user",
            content: request.prompt.clone(),
        }],
        stream: false,
    }
}

fn extract_text(data: OpenAiResponse) -> Result<String, LlmError> {
    let choice = data
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::Parse("response contained no choices".into()))?;

    match choice.message.content {
        Some(content) => Ok(content),
        None => {
            let reason = choice
                .message
                .refusal
                .or(choice.finish_reason)
                .unwrap_or_else(|| "no content returned".to_string());
            Err(LlmError::Blocked(reason))
        }
    }
}

pub async fn chat(
    client: &Client,
    config: &OpenAiConfig,
    request: &ChatRequest,
) -> Result<String, LlmError> {
    let body = build_request(request);

    let mut req = client
        .post(format!("{}/chat/completions", config.base_url))
        .header("Content-Type", "application/json")
        .json(&body);

    if !config.api_key.is_empty() {
        req = req.header("Authorization", format!("Bearer {}", config.api_key));
    }

    let resp = check_status(req.send().await?).await?;
    let data: OpenAiResponse = resp.json().await?;
    extract_text(data)
}
