//! Mock provider for demos and tests
//!
//! Waits a simulated latency, then answers with a scripted reply for the
//! requested model or the default reply (a TB-positive demo report).

use super::{AnalysisProvider, GenerationRequest, SafetySetting};
use crate::error::ProviderError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::debug;

/// Canned report returned by [`MockProvider::demo`]
pub const DEMO_REPORT: &str = r#"{
  "overallAssessment": "The chest radiograph demonstrates patchy consolidation with a thick-walled cavity in the right upper lobe and ipsilateral hilar lymphadenopathy. The appearance is highly suggestive of active pulmonary tuberculosis. The cardiac silhouette is within normal limits.",
  "isTuberculosisDetected": true,
  "tuberculosisReport": "Right apical consolidation with a 2.5 cm cavitary lesion and right hilar lymph node enlargement. No miliary pattern or pleural effusion is seen. Findings favour post-primary (reactivation) tuberculosis. Sputum AFB smear, culture and nucleic acid amplification testing are recommended, along with isolation precautions pending results.",
  "findings": [
    {
      "condition": "Pulmonary Tuberculosis",
      "category": "Pulmonary",
      "severity": "High",
      "confidence": 0.86,
      "description": "Consolidation with cavitation in the right upper lobe apex.",
      "recommendation": "Sputum AFB smear and culture, NAAT, and referral to a TB clinic.",
      "boundingBox": [0.52, 0.08, 0.82, 0.34]
    },
    {
      "condition": "Hilar Lymphadenopathy",
      "category": "Pulmonary",
      "severity": "Medium",
      "confidence": 0.71,
      "description": "Enlarged right hilar lymph nodes.",
      "recommendation": "Correlate with CT chest if clinically indicated.",
      "boundingBox": [0.5, 0.35, 0.62, 0.5]
    }
  ]
}"#;

/// What the mock answers for a model
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Raw text handed to the response validator
    Payload(String),
    Failure(ProviderError),
}

/// One call the mock received
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub model: String,
    pub mime_type: String,
    pub temperature: f32,
    pub safety_settings: Vec<SafetySetting>,
}

/// Scriptable in-process provider
pub struct MockProvider {
    latency: Duration,
    default_reply: MockReply,
    replies: HashMap<String, MockReply>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockProvider {
    /// Mock with no latency that answers every model with the demo report
    pub fn new() -> Self {
        Self {
            latency: Duration::ZERO,
            default_reply: MockReply::Payload(DEMO_REPORT.to_string()),
            replies: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Demo mock with a simulated round-trip delay
    pub fn demo(latency: Duration) -> Self {
        Self::new().with_latency(latency)
    }

    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Reply for any model without a scripted reply
    #[must_use]
    pub fn with_default(mut self, reply: MockReply) -> Self {
        self.default_reply = reply;
        self
    }

    /// Script the reply for one model
    #[must_use]
    pub fn respond(mut self, model: impl Into<String>, reply: MockReply) -> Self {
        self.replies.insert(model.into(), reply);
        self
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Models asked for, in call order
    pub fn called_models(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.model).collect()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnalysisProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, model: &str, request: &GenerationRequest<'_>) -> Result<String, ProviderError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCall {
                model: model.to_string(),
                mime_type: request.image.mime_type().to_string(),
                temperature: request.temperature,
                safety_settings: request.safety_settings.to_vec(),
            });

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let reply = self.replies.get(model).unwrap_or(&self.default_reply);
        debug!(model, scripted = self.replies.contains_key(model), "Mock provider replying");
        match reply {
            MockReply::Payload(text) => Ok(text.clone()),
            MockReply::Failure(error) => Err(error.clone()),
        }
    }
}
