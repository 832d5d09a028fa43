//! Provider failure classification
//!
//! Structured signals win: error-detail reason codes, then the RPC status,
//! then the HTTP status. Message text is matched only when none of those
//! decide, and errors classified that way are tagged
//! [`ClassificationSource::MessagePattern`].

use crate::error::{ClassificationSource, ErrorKind, ProviderError};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref MESSAGE_PATTERNS: Vec<(ErrorKind, Regex)> = vec![
        (
            ErrorKind::Authentication,
            Regex::new(r"(?i)api[ _-]?key[ _-]?(not valid|invalid|expired|missing)|invalid api[ _-]?key|unauthenticated|\b401\b")
                .expect("authentication pattern"),
        ),
        (
            ErrorKind::Permission,
            Regex::new(r"(?i)permission[ _]denied|does not have (the )?permission|forbidden|\b403\b")
                .expect("permission pattern"),
        ),
        (
            ErrorKind::ContentBlocked,
            Regex::new(r"(?i)safety|blocked|prohibited[ _]content")
                .expect("content pattern"),
        ),
        (
            ErrorKind::ServerUnavailable,
            Regex::new(r"(?i)\b5\d\d\b|unavailable|overloaded|timed? ?out|try again later|quota")
                .expect("server pattern"),
        ),
        (
            ErrorKind::BadRequest,
            Regex::new(r"(?i)\b4\d\d\b|invalid[ _]argument|bad request|malformed|unsupported mime")
                .expect("bad request pattern"),
        ),
    ];
}

/// Map a Google error-detail `reason` code
pub fn classify_error_reason(reason: &str) -> Option<ErrorKind> {
    match reason {
        "API_KEY_INVALID" | "API_KEY_EXPIRED" | "API_KEY_NOT_FOUND" | "ACCESS_TOKEN_EXPIRED" => {
            Some(ErrorKind::Authentication)
        }
        "SERVICE_DISABLED" | "API_KEY_SERVICE_BLOCKED" | "API_KEY_HTTP_REFERRER_BLOCKED"
        | "API_KEY_IP_ADDRESS_BLOCKED" | "CONSUMER_SUSPENDED" | "IAM_PERMISSION_DENIED" => {
            Some(ErrorKind::Permission)
        }
        "RATE_LIMIT_EXCEEDED" | "RESOURCE_EXHAUSTED" => Some(ErrorKind::ServerUnavailable),
        _ => None,
    }
}

/// Map a Google RPC status string such as `PERMISSION_DENIED`
pub fn classify_provider_status(status: &str) -> Option<ErrorKind> {
    match status {
        "UNAUTHENTICATED" => Some(ErrorKind::Authentication),
        "PERMISSION_DENIED" => Some(ErrorKind::Permission),
        "INVALID_ARGUMENT" | "FAILED_PRECONDITION" | "OUT_OF_RANGE" | "NOT_FOUND" => {
            Some(ErrorKind::BadRequest)
        }
        "UNAVAILABLE" | "INTERNAL" | "DEADLINE_EXCEEDED" | "RESOURCE_EXHAUSTED" | "ABORTED" => {
            Some(ErrorKind::ServerUnavailable)
        }
        _ => None,
    }
}

/// Map an HTTP status code
pub fn classify_http_status(status: u16) -> Option<ErrorKind> {
    match status {
        401 => Some(ErrorKind::Authentication),
        403 => Some(ErrorKind::Permission),
        408 | 429 => Some(ErrorKind::ServerUnavailable),
        400..=499 => Some(ErrorKind::BadRequest),
        500..=599 => Some(ErrorKind::ServerUnavailable),
        _ => None,
    }
}

/// Last-resort heuristic on free-form error text
pub fn classify_message(message: &str) -> Option<ErrorKind> {
    MESSAGE_PATTERNS
        .iter()
        .find(|(_, pattern)| pattern.is_match(message))
        .map(|(kind, _)| *kind)
}

/// Whether a candidate finish reason or prompt block reason means the
/// safety filter intervened
pub fn is_safety_stop(reason: &str) -> bool {
    matches!(
        reason,
        "SAFETY" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII" | "IMAGE_SAFETY"
    )
}

/// Signals gathered from a failed provider response
#[derive(Debug, Default)]
pub struct FailureSignals<'a> {
    pub http_status: Option<u16>,
    pub provider_status: Option<&'a str>,
    pub reasons: Vec<&'a str>,
    pub message: &'a str,
}

/// Classify a failed call from every available signal
pub fn classify(signals: &FailureSignals<'_>) -> ProviderError {
    let structured = signals
        .reasons
        .iter()
        .find_map(|reason| classify_error_reason(reason))
        .or_else(|| signals.provider_status.and_then(classify_provider_status))
        .map(|kind| (kind, ClassificationSource::ProviderStatus));

    let (kind, classified_by) = structured
        .or_else(|| {
            signals
                .http_status
                .and_then(classify_http_status)
                .map(|kind| (kind, ClassificationSource::HttpStatus))
        })
        .or_else(|| {
            classify_message(signals.message).map(|kind| (kind, ClassificationSource::MessagePattern))
        })
        .unwrap_or((ErrorKind::Unknown, ClassificationSource::Unclassified));

    let message = if signals.message.trim().is_empty() {
        signals
            .http_status
            .map_or_else(|| "no error message".to_string(), |s| format!("HTTP {s}"))
    } else {
        signals.message.trim().to_string()
    };

    let mut error = ProviderError::new(kind, classified_by, message);
    if let Some(status) = signals.http_status {
        error = error.with_http_status(status);
    }
    if let Some(status) = signals.provider_status {
        error = error.with_provider_status(status);
    }
    error
}
