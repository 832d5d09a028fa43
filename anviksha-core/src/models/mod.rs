//! Data models module for Anviksha core
//!
//! This module contains the structures exchanged between the analysis
//! pipeline, the model provider and the caller.

pub mod finding;
pub mod analysis_result;
pub mod request;

pub use finding::{BoundingBox, Category, Finding, Severity};
pub use analysis_result::AnalysisResult;
pub use request::{AnalysisRequest, Credential, ImagePayload};
