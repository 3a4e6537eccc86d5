use super::{check_status, ChatRequest, LlmError};
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Serialize, Deserialize, Default)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: GeminiContent,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

fn build_request(request: &ChatRequest) -> GeminiRequest {
    GeminiRequest {
        contents: vec![GeminiContent {
            role: Some("user".to_string()),
            parts: vec![GeminiPart {
                text: Some(request.prompt.clone()),
            }],
        }],
    }
}

/// Text of the first candidate. A blocked prompt, or a candidate that stopped
/// without producing text (SAFETY, RECITATION, ...), is an error.
fn extract_text(data: GeminiResponse) -> Result<String, LlmError> {
    let Some(candidate) = data.candidates.into_iter().next() else {
        let reason = data
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates returned".to_string());
        return Err(LlmError::Blocked(reason));
    };

    let texts: Vec<String> = candidate
        .content
        .parts
        .into_iter()
        .filter_map(|p| p.text)
        .collect();
    if texts.is_empty() {
        let reason = candidate
            .finish_reason
            .unwrap_or_else(|| "no text returned".to_string());
        return Err(LlmError::Blocked(reason));
    }
    Ok(texts.concat())
}

pub async fn chat(
    client: &Client,
    config: &GeminiConfig,
    request: &ChatRequest,
) -> Result<String, LlmError> {
    let body = build_request(request);

    let resp = client
        .post(format!(
            "{}/models/{}:generateContent",
            config.base_url, request.model
        ))
        .header("Content-Type", "application/json")
        .header("x-goog-api-key", &config.api_key)
        .json(&body)
        .send()
        .await?;

    let data: GeminiResponse = check_status(resp).await?.json().await?;
    extract_text(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> GeminiResponse {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn test_request_uses_user_role_and_text_part() {
        let request = ChatRequest {
            prompt: "What is the hemoglobin level?".into(),
            model: "gemini-2.5-flash".into(),
        };
        let body = serde_json::to_value(build_request(&request)).unwrap();
        assert_eq!(body["contents"].as_array().unwrap().len(), 1);
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(
            body["contents"][0]["parts"][0]["text"],
            "What is the hemoglobin level?"
        );
    }

    #[test]
    fn test_candidate_parts_are_joined() {
        let parsed = parse(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"13"},{"text":".5"}]},"finishReason":"STOP"}]}"#,
        );
        assert_eq!(extract_text(parsed).unwrap(), "13.5");
    }

    #[test]
    fn test_blocked_prompt_is_error() {
        let err = extract_text(parse(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#)).unwrap_err();
        assert_eq!(err.to_string(), "Response blocked: SAFETY");
    }

    #[test]
    fn test_candidate_without_text_is_error() {
        let err = extract_text(parse(
            r#"{"candidates":[{"finishReason":"SAFETY","safetyRatings":[]}]}"#,
        ))
        .unwrap_err();
        assert!(matches!(err, LlmError::Blocked(ref r) if r == "SAFETY"));

        let err = extract_text(parse(
            r#"{"candidates":[{"content":{"parts":[]},"finishReason":"RECITATION"}]}"#,
        ))
        .unwrap_err();
        assert_eq!(err.to_string(), "Response blocked: RECITATION");
    }
}
