//! Anviksha Core - Analysis Data Model
//!
//! This crate provides the typed report produced by the chest X-ray
//! analysis pipeline:
//! - Findings with category, severity, confidence and bounding box
//! - The full per-image analysis result
//! - The ephemeral analysis request (image payload + credential)
//!
//! Every type round-trips through the camelCase JSON shape the model
//! provider is asked to return.

#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
)]
#![allow(
    clippy::module_name_repetitions,  // Often necessary for clarity
)]

pub mod models;

pub use models::{
    analysis_result::{AnalysisResult, EXHAUSTED_ASSESSMENT},
    finding::{BoundingBox, Category, Finding, Severity},
    request::{AnalysisRequest, Credential, ImagePayload, ACCEPTED_UPLOAD_TYPES},
};

/// Result type used throughout Anviksha core
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Anviksha core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Image payload rejected before analysis
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// A finding or result violates a domain invariant
    #[error("Invalid analysis result: {0}")]
    InvalidResult(String),
}
