use super::{check_status, ChatRequest, LlmError};
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct ClaudeConfig {
    pub api_key: String,
    pub base_url: String,
}

#[derive(Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<ClaudeMessage>,
}

#[derive(Serialize)]
struct ClaudeMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    #[serde(default)]
    content: Vec<ClaudeContent>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Deserialize)]
struct ClaudeContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

fn build_request(request: &ChatRequest) -> ClaudeRequest {
    ClaudeRequest {
        model: request.model.clone(),
        max_tokens: 4096,
        messages: vec![ClaudeMessage {
            role: "user",
            content: request.prompt.clone(),
        }],
    }
}

/// Concatenate the text blocks, ignoring any other block types.
fn extract_text(data: ClaudeResponse) -> Result<String, LlmError> {
    let texts: Vec<String> = data
        .content
        .into_iter()
        .filter(|c| c.kind == "text")
        .filter_map(|c| c.text)
        .collect();

    if texts.is_empty() {
        let reason = data
            .stop_reason
            .unwrap_or_else(|| "no text returned".to_string());
        return Err(LlmError::Blocked(reason));
    }
    Ok(texts.concat())
}

pub async fn chat(
    client: &Client,
    config: &ClaudeConfig,
    request: &ChatRequest,
) -> Result<String, LlmError> {
    let body = build_request(request);

    let resp = client
        .post(format!("{}/v1/messages", config.base_url))
        .header("Content-Type", "application/json")
        .header("x-api-key", &config.api_key)
        .header("anthropic-version", "2023-06-01")
        .json(&body)
        .send()
        .await?;

    let data: ClaudeResponse = check_status(resp).await?.json().await?;
    extract_text(data)
}
