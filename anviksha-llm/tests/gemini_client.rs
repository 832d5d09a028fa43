//! Gemini wire format and error mapping against a local mock server

use anviksha_core::{AnalysisRequest, Credential, ImagePayload};
use anviksha_llm::provider::{safety_settings, SafetyThreshold};
use anviksha_llm::schema::provider_response_schema;
use anviksha_llm::{
    AnalysisError, AnalysisPipeline, AnalysisProvider, ClassificationSource, CredentialStore, ErrorKind,
    GeminiProvider, GeminiSettings, GenerationRequest, LlmResult, PipelineConfig, ProviderError,
};
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "gemini-2.5-pro";
const KEY: &str = "test-api-key";

const NORMAL_REPORT: &str = r#"{"overallAssessment": "No acute cardiopulmonary abnormality.", "isTuberculosisDetected": false, "tuberculosisReport": null, "findings": []}"#;

fn provider(server: &MockServer) -> GeminiProvider {
    let settings = GeminiSettings {
        base_url: server.uri(),
        ..Default::default()
    };
    GeminiProvider::new(&settings).unwrap()
}

fn text_response(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
}

fn error_response(code: u16, status: &str, message: &str, reason: Option<&str>) -> Value {
    let details: Vec<Value> = reason
        .map(|r| json!({"@type": "type.googleapis.com/google.rpc.ErrorInfo", "reason": r, "domain": "googleapis.com"}))
        .into_iter()
        .collect();
    json!({"error": {"code": code, "message": message, "status": status, "details": details}})
}

async fn generate(server: &MockServer) -> Result<String, ProviderError> {
    let image = ImagePayload::new(vec![0x89, 0x50, 0x4E, 0x47], "image/png").unwrap();
    let schema = provider_response_schema();
    let settings = safety_settings(SafetyThreshold::BlockNone);
    let credential = Credential::new(KEY);
    let request = GenerationRequest {
        image: &image,
        prompt: "Analyze this chest X-ray.",
        response_schema: &schema,
        temperature: 0.3,
        safety_settings: &settings,
        credential: &credential,
    };
    provider(server).generate(MODEL, &request).await
}

async fn mount(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(format!("/{MODEL}:generateContent")))
        .respond_with(template)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_request_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/{MODEL}:generateContent")))
        .and(header("x-goog-api-key", KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response(NORMAL_REPORT)))
        .expect(1)
        .mount(&server)
        .await;

    let text = generate(&server).await.unwrap();
    assert_eq!(text, NORMAL_REPORT);

    let requests = server.received_requests().await.unwrap();
    let body: Value = requests[0].body_json().unwrap();
    assert!(!requests[0].url.as_str().contains(KEY));

    let parts = &body["contents"][0]["parts"];
    assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
    assert_eq!(parts[0]["inlineData"]["data"], "iVBORw==");
    assert_eq!(parts[1]["text"], "Analyze this chest X-ray.");

    let generation = &body["generationConfig"];
    assert_eq!(generation["responseMimeType"], "application/json");
    assert_eq!(generation["responseSchema"], provider_response_schema());
    assert!((generation["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);

    let safety = body["safetySettings"].as_array().unwrap();
    assert_eq!(safety.len(), 4);
    assert!(safety.iter().all(|s| s["threshold"] == "BLOCK_NONE"));
    assert!(safety.iter().any(|s| s["category"] == "HARM_CATEGORY_DANGEROUS_CONTENT"));
}

#[tokio::test]
async fn test_invalid_api_key_is_authentication() {
    let server = MockServer::start().await;
    let body = error_response(
        400,
        "INVALID_ARGUMENT",
        "API key not valid. Please pass a valid API key.",
        Some("API_KEY_INVALID"),
    );
    mount(&server, ResponseTemplate::new(400).set_body_json(body)).await;

    let error = generate(&server).await.unwrap_err();
    assert_eq!(error.kind, ErrorKind::Authentication);
    assert_eq!(error.classified_by, ClassificationSource::ProviderStatus);
    assert_eq!(error.http_status, Some(400));
    assert!(error.message.contains("API key not valid"));
}

#[tokio::test]
async fn test_permission_denied() {
    let server = MockServer::start().await;
    let body = error_response(
        403,
        "PERMISSION_DENIED",
        "Generative Language API has not been used in project 123 before or it is disabled.",
        Some("SERVICE_DISABLED"),
    );
    mount(&server, ResponseTemplate::new(403).set_body_json(body)).await;

    let error = generate(&server).await.unwrap_err();
    assert_eq!(error.kind, ErrorKind::Permission);
    assert_eq!(error.provider_status.as_deref(), Some("PERMISSION_DENIED"));
}

#[tokio::test]
async fn test_service_unavailable() {
    let server = MockServer::start().await;
    let body = error_response(503, "UNAVAILABLE", "The model is overloaded. Please try again later.", None);
    mount(&server, ResponseTemplate::new(503).set_body_json(body)).await;

    let error = generate(&server).await.unwrap_err();
    assert_eq!(error.kind, ErrorKind::ServerUnavailable);
    assert_eq!(error.http_status, Some(503));
}

#[tokio::test]
async fn test_bad_request() {
    let server = MockServer::start().await;
    let body = error_response(400, "INVALID_ARGUMENT", "Unable to process input image.", None);
    mount(&server, ResponseTemplate::new(400).set_body_json(body)).await;

    assert_eq!(generate(&server).await.unwrap_err().kind, ErrorKind::BadRequest);
}

#[tokio::test]
async fn test_unstructured_error_body_uses_http_status() {
    let server = MockServer::start().await;
    mount(&server, ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>")).await;

    let error = generate(&server).await.unwrap_err();
    assert_eq!(error.kind, ErrorKind::ServerUnavailable);
    assert_eq!(error.classified_by, ClassificationSource::HttpStatus);
}

#[tokio::test]
async fn test_blocked_prompt_is_content_blocked() {
    let server = MockServer::start().await;
    let body = json!({"promptFeedback": {"blockReason": "SAFETY"}});
    mount(&server, ResponseTemplate::new(200).set_body_json(body)).await;

    let error = generate(&server).await.unwrap_err();
    assert_eq!(error.kind, ErrorKind::ContentBlocked);
}

#[tokio::test]
async fn test_empty_candidate_text_fails_validation() -> LlmResult<()> {
    let server = MockServer::start().await;
    mount(&server, ResponseTemplate::new(200).set_body_json(text_response(""))).await;

    let config = PipelineConfig {
        models: vec![MODEL.to_string()],
        ..Default::default()
    };
    let pipeline = AnalysisPipeline::new(Arc::new(provider(&server)), config)?;
    let request = AnalysisRequest::from_parts(vec![0xFF, 0xD8], "image/jpeg", KEY)?;

    let err = pipeline.analyze(&request).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ParseFailure);
    assert_eq!(err.attempts()[0].error.message, "Received an empty or invalid response from the model.");
    Ok(())
}

#[tokio::test]
async fn test_pipeline_falls_back_over_http() -> LlmResult<()> {
    let server = MockServer::start().await;
    mount(
        &server,
        ResponseTemplate::new(503).set_body_json(error_response(503, "UNAVAILABLE", "overloaded", None)),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response(NORMAL_REPORT)))
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = AnalysisPipeline::new(Arc::new(provider(&server)), PipelineConfig::default())?;
    let request = AnalysisRequest::from_parts(vec![0xFF, 0xD8], "image/jpeg", KEY)?;

    let report = pipeline.analyze_detailed(&request).await?;
    assert_eq!(report.model.as_deref(), Some("gemini-2.5-flash"));
    assert_eq!(report.failed_attempts[0].error.kind, ErrorKind::ServerUnavailable);
    assert!(!report.result.is_tuberculosis_detected);
    Ok(())
}

#[tokio::test]
async fn test_invalid_key_clears_stored_credential() -> LlmResult<()> {
    let server = MockServer::start().await;
    let body = error_response(400, "INVALID_ARGUMENT", "API key not valid.", Some("API_KEY_INVALID"));
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    let mut store = CredentialStore::new();
    store.set(KEY);
    let pipeline = AnalysisPipeline::new(Arc::new(provider(&server)), PipelineConfig::default())?;

    let request = AnalysisRequest::new(ImagePayload::new(vec![0xFF, 0xD8], "image/jpeg")?)
        .with_credential(store.current().cloned().unwrap_or_default());
    let err = pipeline.analyze(&request).await.unwrap_err();
    assert!(matches!(err, AnalysisError::Provider { .. }));
    assert!(store.invalidate_if_auth_failure(&err));
    assert!(!store.is_set());
    Ok(())
}
