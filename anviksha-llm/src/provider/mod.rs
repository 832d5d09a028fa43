//! Model providers
//!
//! A provider performs exactly one generation call against one named model.
//! Fallback across models belongs to the pipeline.

pub mod gemini;
pub mod mock;

use crate::error::ProviderError;
use anviksha_core::{Credential, ImagePayload};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use gemini::GeminiProvider;
pub use mock::{MockProvider, MockReply, RecordedCall};

/// Harm categories the provider's safety filter evaluates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarmCategory {
    Harassment,
    HateSpeech,
    SexuallyExplicit,
    DangerousContent,
}

impl HarmCategory {
    pub const ALL: [HarmCategory; 4] = [
        HarmCategory::Harassment,
        HarmCategory::HateSpeech,
        HarmCategory::SexuallyExplicit,
        HarmCategory::DangerousContent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HarmCategory::Harassment => "HARM_CATEGORY_HARASSMENT",
            HarmCategory::HateSpeech => "HARM_CATEGORY_HATE_SPEECH",
            HarmCategory::SexuallyExplicit => "HARM_CATEGORY_SEXUALLY_EXPLICIT",
            HarmCategory::DangerousContent => "HARM_CATEGORY_DANGEROUS_CONTENT",
        }
    }
}

/// Blocking threshold applied to every harm category.
///
/// Medical imagery trips the default filters, so analysis runs with
/// [`SafetyThreshold::BlockNone`] unless configured otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyThreshold {
    #[default]
    BlockNone,
    BlockOnlyHigh,
    BlockMediumAndAbove,
    BlockLowAndAbove,
}

impl SafetyThreshold {
    pub fn as_str(self) -> &'static str {
        match self {
            SafetyThreshold::BlockNone => "BLOCK_NONE",
            SafetyThreshold::BlockOnlyHigh => "BLOCK_ONLY_HIGH",
            SafetyThreshold::BlockMediumAndAbove => "BLOCK_MEDIUM_AND_ABOVE",
            SafetyThreshold::BlockLowAndAbove => "BLOCK_LOW_AND_ABOVE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafetySetting {
    pub category: HarmCategory,
    pub threshold: SafetyThreshold,
}

/// One setting per harm category, all at `threshold`
pub fn safety_settings(threshold: SafetyThreshold) -> Vec<SafetySetting> {
    HarmCategory::ALL
        .iter()
        .map(|&category| SafetySetting { category, threshold })
        .collect()
}

/// Everything a provider needs for one generation call
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub image: &'a ImagePayload,
    pub prompt: &'a str,
    pub response_schema: &'a Value,
    pub temperature: f32,
    pub safety_settings: &'a [SafetySetting],
    pub credential: &'a Credential,
}

/// A multimodal model backend
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Run one generation call against `model` and return the reply text.
    ///
    /// Failures come back already classified.
    async fn generate(&self, model: &str, request: &GenerationRequest<'_>) -> Result<String, ProviderError>;
}
