//! Configuration for the analysis pipeline and its providers
//!
//! Loaded in layers: built-in defaults, then an optional TOML/JSON/YAML
//! file, then `ANVIKSHA_*` environment variables (`ANVIKSHA_PIPELINE__MODELS`
//! maps to `pipeline.models`).

use crate::pipeline::AnalysisPipeline;
use crate::provider::gemini::GEMINI_API_BASE_URL;
use crate::provider::{AnalysisProvider, GeminiProvider, MockProvider, SafetyThreshold};
use crate::{AnalysisError, LlmResult};
use anviksha_utils::config::{load_layered_with_env, string_or_list};
use anviksha_utils::LogLevel;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "ANVIKSHA";

/// Environment keys whose values are comma-separated lists
const ENV_LIST_KEYS: &[&str] = &["pipeline.models"];

/// Models tried in order when none are configured
pub const DEFAULT_MODELS: [&str; 2] = ["gemini-2.5-pro", "gemini-2.5-flash"];

pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Which backend answers analysis requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Gemini,
    Mock,
}

/// Outcome when every model attempt fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExhaustionPolicy {
    /// Return [`AnalysisError::Exhausted`]
    #[default]
    Error,
    /// Return the well-formed placeholder result
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiSettings {
    pub base_url: String,
    /// Whole-request timeout
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            base_url: GEMINI_API_BASE_URL.to_string(),
            timeout_secs: 120,
            connect_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Model identifiers, tried in order
    #[serde(deserialize_with = "string_or_list")]
    pub models: Vec<String>,
    pub temperature: f32,
    pub safety_threshold: SafetyThreshold,
    pub on_exhausted: ExhaustionPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            models: DEFAULT_MODELS.iter().map(ToString::to_string).collect(),
            temperature: DEFAULT_TEMPERATURE,
            safety_threshold: SafetyThreshold::default(),
            on_exhausted: ExhaustionPolicy::default(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> LlmResult<()> {
        if self.models.is_empty() {
            return Err(AnalysisError::Config("at least one model must be configured".to_string()));
        }
        if self.models.iter().any(|m| m.trim().is_empty()) {
            return Err(AnalysisError::Config("model identifiers must not be blank".to_string()));
        }
        if !self.temperature.is_finite() || !(0.0..=1.0).contains(&self.temperature) {
            return Err(AnalysisError::Config(format!(
                "temperature {} must be within [0.0, 1.0]",
                self.temperature
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MockSettings {
    /// Simulated round-trip delay
    pub latency_ms: u64,
}

impl Default for MockSettings {
    fn default() -> Self {
        Self { latency_ms: 1500 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: LogLevel,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self { level: LogLevel::Warning }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnvikshaConfig {
    pub provider: ProviderKind,
    pub gemini: GeminiSettings,
    pub pipeline: PipelineConfig,
    pub mock: MockSettings,
    pub logging: LoggingSettings,
}

impl AnvikshaConfig {
    /// Load defaults, then `path` if given, then the process environment
    pub fn load(path: Option<&Path>) -> LlmResult<Self> {
        Self::load_with_env(path, std::env::vars())
    }

    /// [`AnvikshaConfig::load`] with an explicit environment
    pub fn load_with_env<I>(path: Option<&Path>, vars: I) -> LlmResult<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Self = load_layered_with_env(path, ENV_PREFIX, ENV_LIST_KEYS, vars)
            .map_err(|e| AnalysisError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> LlmResult<()> {
        self.pipeline.validate()?;
        if self.gemini.base_url.trim().is_empty() {
            return Err(AnalysisError::Config("gemini.base_url must not be empty".to_string()));
        }
        if self.gemini.timeout_secs == 0 {
            return Err(AnalysisError::Config("gemini.timeout_secs must be positive".to_string()));
        }
        Ok(())
    }

    /// Instantiate the configured provider
    pub fn build_provider(&self) -> LlmResult<Arc<dyn AnalysisProvider>> {
        let provider: Arc<dyn AnalysisProvider> = match self.provider {
            ProviderKind::Gemini => Arc::new(GeminiProvider::new(&self.gemini)?),
            ProviderKind::Mock => Arc::new(MockProvider::demo(Duration::from_millis(self.mock.latency_ms))),
        };
        Ok(provider)
    }

    /// Provider plus pipeline in one step
    pub fn build_pipeline(&self) -> LlmResult<AnalysisPipeline> {
        AnalysisPipeline::new(self.build_provider()?, self.pipeline.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn no_env() -> Vec<(String, String)> {
        Vec::new()
    }

    #[test]
    fn test_defaults() {
        let config = AnvikshaConfig::load_with_env(None, no_env()).unwrap();
        assert_eq!(config.provider, ProviderKind::Gemini);
        assert_eq!(config.pipeline.models, vec!["gemini-2.5-pro", "gemini-2.5-flash"]);
        assert!((config.pipeline.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.pipeline.safety_threshold, SafetyThreshold::BlockNone);
        assert_eq!(config.pipeline.on_exhausted, ExhaustionPolicy::Error);
        assert_eq!(config.gemini.timeout_secs, 120);
    }

    #[test]
    fn test_file_then_env_precedence() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "provider = \"mock\"\n\n[pipeline]\nmodels = \"gemini-2.5-flash\"\ntemperature = 0.1\non_exhausted = \"placeholder\""
        )
        .unwrap();

        let config = AnvikshaConfig::load_with_env(Some(file.path()), no_env()).unwrap();
        assert_eq!(config.provider, ProviderKind::Mock);
        assert_eq!(config.pipeline.models, vec!["gemini-2.5-flash"]);
        assert_eq!(config.pipeline.on_exhausted, ExhaustionPolicy::Placeholder);

        let env = vec![
            ("ANVIKSHA_PIPELINE__TEMPERATURE".to_string(), "0.5".to_string()),
            ("ANVIKSHA_PIPELINE__MODELS".to_string(), "m1,m2".to_string()),
            ("UNRELATED".to_string(), "x".to_string()),
        ];
        let config = AnvikshaConfig::load_with_env(Some(file.path()), env).unwrap();
        assert!((config.pipeline.temperature - 0.5).abs() < f32::EPSILON);
        assert_eq!(config.pipeline.models, vec!["m1", "m2"]);
        assert_eq!(config.provider, ProviderKind::Mock);
    }

    #[test]
    fn test_rejects_out_of_range_temperature() {
        let env = vec![("ANVIKSHA_PIPELINE__TEMPERATURE".to_string(), "1.5".to_string())];
        assert!(matches!(
            AnvikshaConfig::load_with_env(None, env),
            Err(AnalysisError::Config(_))
        ));
    }

    #[test]
    fn test_rejects_empty_model_list() {
        let config = PipelineConfig {
            models: Vec::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let blank = PipelineConfig {
            models: vec![" ".to_string()],
            ..Default::default()
        };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_mock_provider_from_config() {
        let config = AnvikshaConfig {
            provider: ProviderKind::Mock,
            ..Default::default()
        };
        assert_eq!(config.build_provider().unwrap().name(), "mock");
    }
}
