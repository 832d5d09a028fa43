//! Analysis pipeline
//!
//! Builds one structured-generation request per image and walks the
//! configured model list in order until a reply validates. Attempts are
//! strictly sequential. The pipeline holds no mutable state, so one instance
//! can serve concurrent requests.

use crate::config::{ExhaustionPolicy, PipelineConfig};
use crate::error::{AnalysisError, AttemptFailure};
use crate::prompt::ANALYSIS_PROMPT;
use crate::provider::{safety_settings, AnalysisProvider, GenerationRequest, SafetySetting};
use crate::schema::provider_response_schema;
use crate::validation::ResponseValidator;
use crate::LlmResult;
use anviksha_core::{AnalysisRequest, AnalysisResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Detailed outcome of one analysis
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub id: Uuid,
    /// Model that produced the result; `None` for the exhaustion placeholder
    pub model: Option<String>,
    pub completed_at: DateTime<Utc>,
    /// Attempts that failed before the outcome was decided
    pub failed_attempts: Vec<AttemptFailure>,
    pub result: AnalysisResult,
}

impl AnalysisReport {
    /// Whether this is the placeholder returned after every model failed
    pub fn is_placeholder(&self) -> bool {
        self.model.is_none()
    }
}

pub struct AnalysisPipeline {
    provider: Arc<dyn AnalysisProvider>,
    config: PipelineConfig,
    validator: ResponseValidator,
    response_schema: Value,
    safety_settings: Vec<SafetySetting>,
}

impl AnalysisPipeline {
    pub fn new(provider: Arc<dyn AnalysisProvider>, config: PipelineConfig) -> LlmResult<Self> {
        config.validate()?;
        let safety_settings = safety_settings(config.safety_threshold);
        Ok(Self {
            provider,
            config,
            validator: ResponseValidator::new()?,
            response_schema: provider_response_schema(),
            safety_settings,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Analyze one image and return the validated report
    pub async fn analyze(&self, request: &AnalysisRequest) -> LlmResult<AnalysisResult> {
        self.analyze_detailed(request).await.map(|report| report.result)
    }

    /// Analyze one image and return the report with attempt metadata
    pub async fn analyze_detailed(&self, request: &AnalysisRequest) -> LlmResult<AnalysisReport> {
        let id = Uuid::new_v4();
        let span = info_span!("analysis", %id, provider = self.provider.name());
        self.run(id, request).instrument(span).await
    }

    async fn run(&self, id: Uuid, request: &AnalysisRequest) -> LlmResult<AnalysisReport> {
        let Some(credential) = request.credential() else {
            warn!("No API key supplied; skipping analysis");
            return Err(AnalysisError::MissingCredential);
        };

        let generation = GenerationRequest {
            image: request.image(),
            prompt: ANALYSIS_PROMPT,
            response_schema: &self.response_schema,
            temperature: self.config.temperature,
            safety_settings: &self.safety_settings,
            credential,
        };

        let mut failed_attempts = Vec::new();
        for model in &self.config.models {
            debug!(model = %model, "Attempting analysis");

            let outcome = match self.provider.generate(model, &generation).await {
                Ok(text) => self.validator.parse(&text),
                Err(error) => Err(error),
            };

            match outcome {
                Ok(result) => {
                    for issue in result.consistency_issues() {
                        warn!(model = %model, "Inconsistent report: {issue}");
                    }
                    info!(model = %model, findings = result.findings.len(), "Analysis succeeded");
                    return Ok(AnalysisReport {
                        id,
                        model: Some(model.clone()),
                        completed_at: Utc::now(),
                        failed_attempts,
                        result,
                    });
                }
                Err(error) if !error.kind.allows_fallback() => {
                    warn!(model = %model, kind = %error.kind, "Analysis failed; not trying other models");
                    return Err(AnalysisError::Provider {
                        model: model.clone(),
                        error,
                    });
                }
                Err(error) => {
                    warn!(model = %model, kind = %error.kind, "Model failed: {}", error.message);
                    failed_attempts.push(AttemptFailure {
                        model: model.clone(),
                        error,
                    });
                }
            }
        }

        warn!(attempts = failed_attempts.len(), "All models failed");
        match self.config.on_exhausted {
            ExhaustionPolicy::Error => Err(AnalysisError::Exhausted {
                attempts: failed_attempts,
            }),
            ExhaustionPolicy::Placeholder => Ok(AnalysisReport {
                id,
                model: None,
                completed_at: Utc::now(),
                failed_attempts,
                result: AnalysisResult::exhausted(),
            }),
        }
    }
}
