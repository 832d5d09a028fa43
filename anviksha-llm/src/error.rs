//! Error taxonomy for analysis failures
//!
//! Provider-level failures are [`ProviderError`]s, each already classified
//! into an [`ErrorKind`]. The pipeline surfaces [`AnalysisError`] to callers.

use serde::{Deserialize, Serialize};

/// Coarse failure category shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Missing or invalid credential
    Authentication,
    /// Valid credential without access to the model
    Permission,
    /// Malformed image or upstream request
    BadRequest,
    /// Transient upstream failure; retry later
    ServerUnavailable,
    /// Rejected by the provider's safety filter
    ContentBlocked,
    /// Empty response or response not matching the schema
    ParseFailure,
    /// Anything else, original message preserved
    Unknown,
}

impl ErrorKind {
    /// Whether the next model in the fallback list is worth trying.
    ///
    /// Credential problems fail identically on every model.
    pub fn allows_fallback(self) -> bool {
        !matches!(self, ErrorKind::Authentication | ErrorKind::Permission)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Authentication => "Authentication",
            ErrorKind::Permission => "Permission",
            ErrorKind::BadRequest => "BadRequest",
            ErrorKind::ServerUnavailable => "ServerUnavailable",
            ErrorKind::ContentBlocked => "ContentBlocked",
            ErrorKind::ParseFailure => "ParseFailure",
            ErrorKind::Unknown => "Unknown",
        }
    }

    /// User-facing guidance for this kind of failure
    pub fn guidance(self) -> &'static str {
        match self {
            ErrorKind::Authentication => "The API key is missing or was rejected. Please enter a valid key.",
            ErrorKind::Permission => "The API key is valid but does not have access to the analysis model.",
            ErrorKind::BadRequest => "The image or request was rejected as malformed. Please try a different image.",
            ErrorKind::ServerUnavailable => "The analysis service is temporarily unavailable. Please try again later.",
            ErrorKind::ContentBlocked => "The request was blocked by the provider's content safety filter.",
            ErrorKind::ParseFailure => "The model returned a response that did not match the expected report format.",
            ErrorKind::Unknown => "An unexpected error occurred.",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which signal decided an error's [`ErrorKind`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassificationSource {
    /// The request never completed (connect failure, timeout)
    Transport,
    /// Structured status or reason code from the provider's error body
    ProviderStatus,
    /// HTTP status code alone
    HttpStatus,
    /// Inspection of a successful response body (block reason, empty text, schema)
    ResponseBody,
    /// Heuristic match on the error message text
    MessagePattern,
    /// No signal matched
    Unclassified,
}

/// One failed provider call, classified
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ProviderError {
    pub kind: ErrorKind,
    pub classified_by: ClassificationSource,
    pub http_status: Option<u16>,
    /// Provider status code such as `PERMISSION_DENIED`
    pub provider_status: Option<String>,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ErrorKind, classified_by: ClassificationSource, message: impl Into<String>) -> Self {
        Self {
            kind,
            classified_by,
            http_status: None,
            provider_status: None,
            message: message.into(),
        }
    }

    /// The response could not be turned into a valid report
    pub fn parse_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParseFailure, ClassificationSource::ResponseBody, message)
    }

    /// The provider's safety filter rejected the request or the answer
    pub fn content_blocked(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ContentBlocked, ClassificationSource::ResponseBody, message)
    }

    #[must_use]
    pub fn with_http_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    #[must_use]
    pub fn with_provider_status(mut self, status: impl Into<String>) -> Self {
        self.provider_status = Some(status.into());
        self
    }

    /// Whether the kind came from the last-resort message heuristics
    pub fn is_heuristic(&self) -> bool {
        self.classified_by == ClassificationSource::MessagePattern
    }
}

/// A model attempt that failed before a later one succeeded or all ran out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptFailure {
    pub model: String,
    pub error: ProviderError,
}

fn last_attempt_message(attempts: &[AttemptFailure]) -> String {
    attempts
        .last()
        .map_or_else(|| "no models configured".to_string(), |a| format!("{} ({})", a.error, a.model))
}

/// Error surfaced by the analysis pipeline
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// No credential was supplied; nothing was sent to the provider
    #[error("API key is missing; analysis was not attempted")]
    MissingCredential,

    /// Image payload rejected before analysis
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// A failure that stops the fallback sequence
    #[error("Model {model} failed with {error}")]
    Provider { model: String, error: ProviderError },

    /// Every configured model failed
    #[error("Analysis failed after {} attempt(s); last error: {}", .attempts.len(), last_attempt_message(.attempts))]
    Exhausted { attempts: Vec<AttemptFailure> },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP client construction error
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl AnalysisError {
    /// Taxonomy bucket for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalysisError::MissingCredential => ErrorKind::Authentication,
            AnalysisError::InvalidImage(_) => ErrorKind::BadRequest,
            AnalysisError::Provider { error, .. } => error.kind,
            AnalysisError::Exhausted { attempts } => {
                attempts.last().map_or(ErrorKind::Unknown, |a| a.error.kind)
            }
            AnalysisError::Config(_) | AnalysisError::Http(_) => ErrorKind::Unknown,
        }
    }

    /// Short notification text
    pub fn headline(&self) -> &'static str {
        if self.requires_reauthentication() {
            "API Key authentication failed"
        } else {
            "Analysis Failed"
        }
    }

    /// Full message for a detail panel
    pub fn detail(&self) -> String {
        match self.kind() {
            ErrorKind::Unknown => self.to_string(),
            kind => format!("{} Details: {self}", kind.guidance()),
        }
    }

    /// Whether the caller should discard its stored credential
    pub fn requires_reauthentication(&self) -> bool {
        self.kind() == ErrorKind::Authentication
    }

    /// Failed attempts recorded before the pipeline gave up
    pub fn attempts(&self) -> &[AttemptFailure] {
        match self {
            AnalysisError::Exhausted { attempts } => attempts,
            _ => &[],
        }
    }
}

impl From<anviksha_core::Error> for AnalysisError {
    fn from(err: anviksha_core::Error) -> Self {
        match err {
            anviksha_core::Error::InvalidImage(message) => AnalysisError::InvalidImage(message),
            other => AnalysisError::Config(other.to_string()),
        }
    }
}
