// Gemini (Google Generative Language API) adapter
// API Reference: https://ai.google.dev/api/generate-content
//
// One request per call: text prompt plus inline images, optional JSON output
// mode and thinking budget. No streaming.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::llm::provider::AiProvider;
use crate::types::{AiCallOptions, AiResponse, AppError, AppResult, ResponseFormat};

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiAdapter {
    client: Client,
    api_key: String,
    base_url: String,
}

// Request types for the generateContent endpoint
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: i32,
}

// Response types
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

#[derive(Deserialize)]
struct GeminiError {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl GeminiAdapter {
    pub fn new(api_key: &str) -> AppResult<Self> {
        Self::with_base_url(api_key, GEMINI_API_BASE)
    }

    /// Point the adapter at a different API root (proxies, tests).
    pub fn with_base_url(api_key: &str, base_url: &str) -> AppResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    fn build_request(options: &AiCallOptions) -> GenerateContentRequest {
        let mut parts = Vec::with_capacity(options.images.len() + 1);
        parts.push(Part::Text {
            text: options.prompt.clone(),
        });
        parts.extend(options.images.iter().map(|image| Part::InlineData {
            inline_data: InlineData {
                mime_type: image.mime_type.clone(),
                data: STANDARD.encode(&image.data),
            },
        }));

        let generation_config = GenerationConfig {
            response_mime_type: match options.response_format {
                Some(ResponseFormat::Json) => Some("application/json"),
                Some(ResponseFormat::Text) => Some("text/plain"),
                None => None,
            },
            thinking_config: options
                .thinking_budget
                .map(|thinking_budget| ThinkingConfig { thinking_budget }),
        };
        let generation_config = (generation_config.response_mime_type.is_some()
            || generation_config.thinking_config.is_some())
        .then_some(generation_config);

        GenerateContentRequest {
            contents: vec![Content { role: "user", parts }],
            generation_config,
        }
    }

    fn extract_text(response: GenerateContentResponse) -> AppResult<String> {
        let Some(candidate) = response.candidates.into_iter().next() else {
            let reason = response
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates".to_string());
            return Err(AppError::AiApi(format!("Gemini returned no output: {}", reason)));
        };

        let text: String = candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter(|p| !p.thought.unwrap_or(false))
            .filter_map(|p| p.text)
            .collect();

        if text.is_empty() {
            return Err(AppError::AiApi(format!(
                "Gemini returned an empty response (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        Ok(text)
    }
}

#[async_trait]
impl AiProvider for GeminiAdapter {
    async fn generate(&self, options: &AiCallOptions) -> AppResult<AiResponse> {
        let request = Self::build_request(options);

        let response = self
            .client
            .post(self.endpoint(&options.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::AiApi(format!("Gemini request failed: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            if let Ok(error_response) = serde_json::from_str::<GeminiErrorResponse>(&error_text) {
                return Err(AppError::AiApi(format!(
                    "Gemini API error ({}): {} ({})",
                    status,
                    error_response.error.message,
                    error_response.error.status.unwrap_or_default()
                )));
            }

            return Err(AppError::AiApi(format!(
                "Gemini API error ({}): {}",
                status, error_text
            )));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AppError::AiApi(format!("Failed to parse Gemini response: {}", e)))?;

        Ok(AiResponse {
            text: Self::extract_text(body)?,
        })
    }
}

/// Model identifiers used by the service.
pub mod models {
    /// Fast multimodal model, used when no override is given.
    pub const GEMINI_2_5_FLASH: &str = "gemini-2.5-flash";
    /// Higher quality, slower; worth it for personality reports.
    pub const GEMINI_2_5_PRO: &str = "gemini-2.5-pro";
    pub const GEMINI_2_5_FLASH_LITE: &str = "gemini-2.5-flash-lite";

    pub const DEFAULT: &str = GEMINI_2_5_FLASH;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ImageInput;
    use mockito::Matcher;
    use serde_json::json;

    #[test]
    fn test_request_shape() {
        let options = AiCallOptions::new("Describe this")
            .images(vec![ImageInput::jpeg(vec![1u8, 2, 3])])
            .json()
            .thinking_budget(0);

        let body = serde_json::to_value(GeminiAdapter::build_request(&options)).unwrap();
        assert_eq!(
            body,
            json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        {"text": "Describe this"},
                        {"inlineData": {"mimeType": "image/jpeg", "data": "AQID"}}
                    ]
                }],
                "generationConfig": {
                    "responseMimeType": "application/json",
                    "thinkingConfig": {"thinkingBudget": 0}
                }
            })
        );
    }

    #[test]
    fn test_plain_request_has_no_generation_config() {
        let body = serde_json::to_value(GeminiAdapter::build_request(&AiCallOptions::new("hi"))).unwrap();
        assert!(body.get("generationConfig").is_none());
    }

    #[tokio::test]
    async fn test_generate_joins_text_parts() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .match_header("x-goog-api-key", "test-key")
            .match_body(Matcher::PartialJson(json!({
                "generationConfig": {"responseMimeType": "application/json"}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "candidates": [{
                        "content": {"parts": [
                            {"text": "thinking...", "thought": true},
                            {"text": "{\"a\":"},
                            {"text": " 1}"}
                        ]},
                        "finishReason": "STOP"
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let adapter = GeminiAdapter::with_base_url("test-key", &server.url()).unwrap();
        let mut options = AiCallOptions::new("give me json").json();
        options.model = models::GEMINI_2_5_FLASH.to_string();

        let response = adapter.generate(&options).await.unwrap();
        assert_eq!(response.text, "{\"a\": 1}");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_api_error_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", Matcher::Any)
            .with_status(429)
            .with_body(
                json!({"error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}})
                    .to_string(),
            )
            .create_async()
            .await;

        let adapter = GeminiAdapter::with_base_url("k", &server.url()).unwrap();
        let mut options = AiCallOptions::new("hi");
        options.model = "m".to_string();

        match adapter.generate(&options).await {
            Err(AppError::AiApi(message)) => {
                assert!(message.contains("Quota exceeded"));
                assert!(message.contains("RESOURCE_EXHAUSTED"));
            }
            other => panic!("unexpected result: {:?}", other.map(|r| r.text)),
        }
    }

    #[tokio::test]
    async fn test_blocked_prompt_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", Matcher::Any)
            .with_status(200)
            .with_body(json!({"promptFeedback": {"blockReason": "SAFETY"}}).to_string())
            .create_async()
            .await;

        let adapter = GeminiAdapter::with_base_url("k", &server.url()).unwrap();
        let mut options = AiCallOptions::new("hi");
        options.model = "m".to_string();

        let err = adapter.generate(&options).await.unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }
}
