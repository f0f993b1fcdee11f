use super::{Attachment, GenerateRequest, LLMClient};
use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::LLMConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
}

#[derive(Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_data: Option<FileData>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FileData {
    mime_type: String,
    file_uri: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

const SAFETY_SETTINGS: [(&str, &str); 3] = [
    ("HARM_CATEGORY_DANGEROUS_CONTENT", "BLOCK_ONLY_HIGH"),
    ("HARM_CATEGORY_HARASSMENT", "BLOCK_MEDIUM_AND_ABOVE"),
    ("HARM_CATEGORY_SEXUALLY_EXPLICIT", "BLOCK_LOW_AND_ABOVE"),
];

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Deserialize)]
struct GeminiCandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct GeminiErrorEnvelope {
    error: GeminiErrorBody,
}

#[derive(Deserialize)]
struct GeminiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

pub struct GeminiClient {
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    fn api_key(config: &LLMConfig) -> Result<String> {
        config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AppError::LLMError("Missing API key for Google provider".to_string()))
    }
}

fn build_body(config: &LLMConfig, request: &GenerateRequest) -> GeminiRequest {
    let system_instruction = if request.system.trim().is_empty() {
        None
    } else {
        Some(GeminiContent {
            parts: vec![GeminiPart {
                text: Some(request.system.clone()),
                ..Default::default()
            }],
            role: None,
        })
    };

    let mut parts = Vec::new();
    if !request.user.trim().is_empty() {
        parts.push(GeminiPart {
            text: Some(request.user.clone()),
            ..Default::default()
        });
    }
    match &request.attachment {
        Some(Attachment::Inline { mime_type, data }) => parts.push(GeminiPart {
            inline_data: Some(InlineData {
                mime_type: mime_type.clone(),
                data: data.clone(),
            }),
            ..Default::default()
        }),
        Some(Attachment::Remote { mime_type, uri }) => parts.push(GeminiPart {
            file_data: Some(FileData {
                mime_type: mime_type.clone(),
                file_uri: uri.clone(),
            }),
            ..Default::default()
        }),
        None => {}
    }

    GeminiRequest {
        system_instruction,
        contents: vec![GeminiContent {
            parts,
            role: Some("user".to_string()),
        }],
        generation_config: Some(GenerationConfig {
            temperature: config.temperature,
            max_output_tokens: config.max_tokens,
        }),
        safety_settings: SAFETY_SETTINGS
            .iter()
            .map(|&(category, threshold)| SafetySetting {
                category,
                threshold,
            })
            .collect(),
    }
}

/// Keep the API status text (INVALID_ARGUMENT, DEADLINE_EXCEEDED, ...) in the
/// message so callers can classify the failure.
fn describe_api_error(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<GeminiErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.status.is_empty() => format!(
            "API error ({}): {}: {}",
            status, envelope.error.status, envelope.error.message
        ),
        Ok(envelope) => format!("API error ({}): {}", status, envelope.error.message),
        Err(_) => format!("API error ({}): {}", status, body),
    }
}

fn extract_text(response: GeminiResponse) -> Result<String> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
            .unwrap_or_else(|| "no candidates".to_string());
        return Err(AppError::LLMError(format!(
            "Model returned no output ({})",
            reason
        )));
    };

    let text: String = candidate
        .content
        .map(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|part| part.text)
        .collect();

    Ok(text)
}

#[async_trait]
impl LLMClient for GeminiClient {
    async fn generate(&self, config: &LLMConfig, request: &GenerateRequest) -> Result<String> {
        let api_key = Self::api_key(config)?;
        let model_id = config.model.trim();
        let base_url = config.base_url.trim_end_matches('/');
        let url = format!("{}/{}:generateContent", base_url, model_id);

        let body = build_body(config, request);
        debug!(model = model_id, "Sending generateContent request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::LLMError(format!("Request timeout: {}", e))
                } else {
                    AppError::LLMError(format!("Request failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::LLMError(describe_api_error(status, &text)));
        }

        let json: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AppError::LLMError(format!("Failed to parse JSON: {}", e)))?;

        extract_text(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(attachment: Option<Attachment>) -> GenerateRequest {
        GenerateRequest {
            system: "extract tables".to_string(),
            user: "here".to_string(),
            attachment,
        }
    }

    #[test]
    fn test_body_with_inline_pdf() {
        let body = build_body(
            &LLMConfig::default(),
            &request(Some(Attachment::Inline {
                mime_type: "application/pdf".to_string(),
                data: "JVBERi0=".to_string(),
            })),
        );
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "extract tables");
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][0]["parts"][0], json!({"text": "here"}));
        assert_eq!(
            value["contents"][0]["parts"][1],
            json!({"inlineData": {"mimeType": "application/pdf", "data": "JVBERi0="}})
        );
        assert_eq!(value["generationConfig"], json!({"temperature": 0.0}));
        assert_eq!(value["safetySettings"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_body_with_remote_pdf() {
        let body = build_body(
            &LLMConfig::default(),
            &request(Some(Attachment::Remote {
                mime_type: "application/pdf".to_string(),
                uri: "https://example.com/a.pdf".to_string(),
            })),
        );
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(
            value["contents"][0]["parts"][1]["fileData"]["fileUri"],
            "https://example.com/a.pdf"
        );
    }

    #[test]
    fn test_api_error_keeps_status_text() {
        let body = r#"{"error": {"code": 400, "message": "Request contains an invalid argument.", "status": "INVALID_ARGUMENT"}}"#;
        let message = describe_api_error(reqwest::StatusCode::BAD_REQUEST, body);

        assert!(message.contains("INVALID_ARGUMENT"));
        assert!(message.contains("invalid argument"));
    }

    #[test]
    fn test_api_error_with_plain_body() {
        let message = describe_api_error(reqwest::StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(message, "API error (502 Bad Gateway): upstream down");
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "A,B\n"}, {"text": "1,2"}]}}]
        }))
        .unwrap();

        assert_eq!(extract_text(response).unwrap(), "A,B\n1,2");
    }

    #[test]
    fn test_extract_text_reports_block_reason() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();

        let err = extract_text(response).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }
}
