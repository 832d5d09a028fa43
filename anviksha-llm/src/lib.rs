//! Anviksha LLM - Structured Chest X-Ray Analysis
//!
//! Turns an uploaded image into a validated, typed findings report by calling
//! a multimodal generative model with a fixed instruction and a structured
//! output schema.
//!
//! Key Components:
//! - [`AnalysisPipeline`]: ordered model fallback and the exhaustion policy
//! - [`AnalysisProvider`] with Gemini REST and mock implementations
//! - Response validation against the report schema and domain invariants
//! - Error taxonomy with structured-first classification
//! - Session-scoped [`CredentialStore`]

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod classify;
pub mod config;
pub mod credential;
pub mod error;
pub mod pipeline;
pub mod prompt;
pub mod provider;
pub mod schema;
pub mod validation;

// Re-export main types for convenience
pub use config::{AnvikshaConfig, ExhaustionPolicy, GeminiSettings, MockSettings, PipelineConfig, ProviderKind};
pub use credential::CredentialStore;
pub use error::{AnalysisError, AttemptFailure, ClassificationSource, ErrorKind, ProviderError};
pub use pipeline::{AnalysisPipeline, AnalysisReport};
pub use provider::{
    AnalysisProvider, GeminiProvider, GenerationRequest, MockProvider, MockReply, SafetyThreshold,
};
pub use validation::ResponseValidator;

/// Result type for analysis operations
pub type LlmResult<T> = Result<T, AnalysisError>;
