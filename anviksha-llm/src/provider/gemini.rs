//! Google AI Studio (Gemini) API Integration
//!
//! One `generateContent` call per model attempt, with the image inlined as
//! base64 and a structured-output schema attached.

use super::{AnalysisProvider, GenerationRequest, SafetySetting};
use crate::classify::{classify, is_safety_stop, FailureSignals};
use crate::config::GeminiSettings;
use crate::error::{ClassificationSource, ErrorKind, ProviderError};
use crate::LlmResult;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Request structure for Gemini API
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
    safety_settings: Vec<WireSafetySetting>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum Part<'a> {
    InlineData(InlineData<'a>),
    Text(&'a str),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'static str,
    response_schema: &'a Value,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct WireSafetySetting {
    category: &'static str,
    threshold: &'static str,
}

impl From<&SafetySetting> for WireSafetySetting {
    fn from(setting: &SafetySetting) -> Self {
        Self {
            category: setting.category.as_str(),
            threshold: setting.threshold.as_str(),
        }
    }
}

/// Response structure from Gemini API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ContentResponse>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Debug, Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Google API error envelope
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    status: Option<String>,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    reason: Option<String>,
}

/// Gemini API client
pub struct GeminiProvider {
    base_url: String,
    client: Client,
}

impl GeminiProvider {
    pub fn new(settings: &GeminiSettings) -> LlmResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .build()?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/{}:generateContent", self.base_url, model)
    }
}

fn build_request<'a>(request: &'a GenerationRequest<'a>) -> GeminiRequest<'a> {
    GeminiRequest {
        contents: vec![Content {
            parts: vec![
                Part::InlineData(InlineData {
                    mime_type: request.image.mime_type(),
                    data: request.image.to_base64(),
                }),
                Part::Text(request.prompt),
            ],
        }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json",
            response_schema: request.response_schema,
            temperature: request.temperature,
        },
        safety_settings: request.safety_settings.iter().map(WireSafetySetting::from).collect(),
    }
}

fn transport_error(err: &reqwest::Error) -> ProviderError {
    if err.is_decode() {
        return ProviderError::parse_failure(format!("Failed to read Gemini response: {err}"));
    }
    ProviderError::new(
        ErrorKind::ServerUnavailable,
        ClassificationSource::Transport,
        format!("Gemini API request failed: {err}"),
    )
}

/// Classify a non-success response from its status and body
fn classify_failure(status: u16, body: &str) -> ProviderError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            let reasons: Vec<&str> = envelope
                .error
                .details
                .iter()
                .filter_map(|d| d.reason.as_deref())
                .collect();
            classify(&FailureSignals {
                http_status: Some(status),
                provider_status: envelope.error.status.as_deref(),
                reasons,
                message: &envelope.error.message,
            })
        }
        Err(_) => classify(&FailureSignals {
            http_status: Some(status),
            message: body,
            ..Default::default()
        }),
    }
}

/// Pull the reply text out of a successful response
fn extract_text(response: GeminiResponse) -> Result<String, ProviderError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ProviderError::content_blocked(format!(
            "Request was blocked by the safety filter ({reason})"
        ))
        .with_provider_status(reason));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::parse_failure("No candidates in Gemini response"))?;

    if let Some(reason) = candidate.finish_reason.as_deref().filter(|r| is_safety_stop(r)) {
        return Err(ProviderError::content_blocked(format!(
            "Response was stopped by the safety filter ({reason})"
        ))
        .with_provider_status(reason));
    }

    Ok(candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<String>())
        .unwrap_or_default())
}

#[async_trait]
impl AnalysisProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, model: &str, request: &GenerationRequest<'_>) -> Result<String, ProviderError> {
        let body = build_request(request);
        debug!(model, image_bytes = request.image.len(), "Sending generateContent request");

        let response = self
            .client
            .post(self.endpoint(model))
            .header(API_KEY_HEADER, request.credential.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let error = classify_failure(status.as_u16(), &error_text);
            debug!(model, status = status.as_u16(), kind = %error.kind, "Gemini API returned an error");
            return Err(error);
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| transport_error(&e))?;
        extract_text(gemini_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{safety_settings, SafetyThreshold};
    use anviksha_core::{Credential, ImagePayload};
    use serde_json::json;

    #[test]
    fn test_request_wire_shape() {
        let image = ImagePayload::new(vec![1, 2, 3], "image/png").unwrap();
        let schema = json!({"type": "OBJECT"});
        let settings = safety_settings(SafetyThreshold::BlockNone);
        let credential = Credential::new("secret");
        let request = GenerationRequest {
            image: &image,
            prompt: "describe",
            response_schema: &schema,
            temperature: 0.3,
            safety_settings: &settings,
            credential: &credential,
        };

        let wire = serde_json::to_value(build_request(&request)).unwrap();
        assert_eq!(wire["contents"][0]["parts"][0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(wire["contents"][0]["parts"][0]["inlineData"]["data"], "AQID");
        assert_eq!(wire["contents"][0]["parts"][1]["text"], "describe");
        assert_eq!(wire["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(wire["generationConfig"]["responseSchema"], schema);
        assert_eq!(wire["safetySettings"][0]["threshold"], "BLOCK_NONE");
        assert!(!wire.to_string().contains("secret"));
    }

    #[test]
    fn test_invalid_key_envelope() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid. Please pass a valid API key.",
            "status": "INVALID_ARGUMENT",
            "details": [{"@type": "type.googleapis.com/google.rpc.ErrorInfo", "reason": "API_KEY_INVALID"}]}}"#;
        let error = classify_failure(400, body);
        assert_eq!(error.kind, ErrorKind::Authentication);
        assert_eq!(error.http_status, Some(400));
    }

    #[test]
    fn test_non_json_error_body() {
        let error = classify_failure(502, "Bad Gateway");
        assert_eq!(error.kind, ErrorKind::ServerUnavailable);
        assert_eq!(error.classified_by, ClassificationSource::HttpStatus);
    }

    #[test]
    fn test_extract_concatenates_parts() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "{\"a\":"}, {"text": "1}"}]}, "finishReason": "STOP"}]
        }))
        .unwrap();
        assert_eq!(extract_text(response).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn test_extract_blocked_prompt() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();
        let error = extract_text(response).unwrap_err();
        assert_eq!(error.kind, ErrorKind::ContentBlocked);
        assert_eq!(error.provider_status.as_deref(), Some("SAFETY"));
    }

    #[test]
    fn test_extract_safety_finish_reason() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{"finishReason": "SAFETY"}]
        }))
        .unwrap();
        assert_eq!(extract_text(response).unwrap_err().kind, ErrorKind::ContentBlocked);
    }

    #[test]
    fn test_extract_no_candidates() {
        let response: GeminiResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(extract_text(response).unwrap_err().kind, ErrorKind::ParseFailure);
    }

    #[tokio::test]
    #[ignore] // Requires API key
    async fn test_gemini_live_call() {
        let api_key = std::env::var("GEMINI_API_KEY")
            .expect("GEMINI_API_KEY must be set for this test");

        // 1x1 white PNG
        let png = vec![
            0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
            0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00, 0x00, 0x90, 0x77, 0x53,
            0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49, 0x44, 0x41, 0x54, 0x08, 0xD7, 0x63, 0xF8, 0xFF, 0xFF, 0x3F,
            0x00, 0x05, 0xFE, 0x02, 0xFE, 0xDC, 0xCC, 0x59, 0xE7, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E,
            0x44, 0xAE, 0x42, 0x60, 0x82,
        ];
        let provider = GeminiProvider::new(&GeminiSettings::default()).unwrap();
        let image = ImagePayload::new(png, "image/png").unwrap();
        let schema = crate::schema::provider_response_schema();
        let settings = safety_settings(SafetyThreshold::BlockNone);
        let credential = Credential::new(api_key);
        let request = GenerationRequest {
            image: &image,
            prompt: crate::prompt::ANALYSIS_PROMPT,
            response_schema: &schema,
            temperature: 0.3,
            safety_settings: &settings,
            credential: &credential,
        };

        let response = provider.generate("gemini-2.5-flash", &request).await;
        assert!(response.is_ok());
    }
}
