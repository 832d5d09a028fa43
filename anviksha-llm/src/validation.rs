//! Response validation
//!
//! Turns the raw text a provider returned into an [`AnalysisResult`], or a
//! [`ProviderError`] of kind [`ErrorKind::ParseFailure`](crate::ErrorKind)
//! so the pipeline can move on to the next model.

use crate::error::ProviderError;
use crate::schema::validation_schema;
use crate::{AnalysisError, LlmResult};
use anviksha_core::AnalysisResult;
use jsonschema::JSONSchema;
use serde_json::Value;
use tracing::debug;

pub const EMPTY_RESPONSE_MESSAGE: &str = "Received an empty or invalid response from the model.";

/// Validates provider replies against the report schema and domain invariants
pub struct ResponseValidator {
    schema: JSONSchema,
}

impl ResponseValidator {
    pub fn new() -> LlmResult<Self> {
        let schema = JSONSchema::compile(&validation_schema())
            .map_err(|e| AnalysisError::Config(format!("invalid report schema: {e}")))?;
        Ok(Self { schema })
    }

    /// Parse and validate one reply
    pub fn parse(&self, raw: &str) -> Result<AnalysisResult, ProviderError> {
        let text = strip_code_fence(raw.trim());
        if text.is_empty() {
            return Err(ProviderError::parse_failure(EMPTY_RESPONSE_MESSAGE));
        }

        let mut value: Value = serde_json::from_str(text)
            .map_err(|e| ProviderError::parse_failure(format!("response is not valid JSON: {e}")))?;

        if rescale_percentage_boxes(&mut value) {
            debug!("Rescaled percentage bounding boxes to fractions");
        }

        if let Err(errors) = self.schema.validate(&value) {
            let details: Vec<String> = errors
                .map(|e| {
                    let path = e.instance_path.to_string();
                    if path.is_empty() {
                        e.to_string()
                    } else {
                        format!("{path}: {e}")
                    }
                })
                .collect();
            return Err(ProviderError::parse_failure(format!(
                "response does not match the report schema: {}",
                details.join("; ")
            )));
        }

        let mut result: AnalysisResult = serde_json::from_value(value)
            .map_err(|e| ProviderError::parse_failure(format!("response has the wrong shape: {e}")))?;

        if result.discard_stray_tuberculosis_report() {
            debug!("Dropped tuberculosisReport from a TB-negative result");
        }

        result
            .validate()
            .map_err(|e| ProviderError::parse_failure(e.to_string()))?;

        Ok(result)
    }
}

/// Remove a surrounding markdown code fence, if present
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Skip the info string (`json`) on the opening fence line
    let body = rest.find('\n').map_or("", |i| &rest[i + 1..]);
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// Convert bounding boxes expressed in percent (0-100) to fractions.
///
/// A box `[x_min, y_min, x_max, y_max]` is rescaled only when it reads as a
/// percentage box throughout: every coordinate within `[0, 100]`, both maxima
/// above 1 and no coordinate strictly between 0 and 1. Mixed boxes are left
/// alone so the schema rejects them. Returns whether anything changed.
fn rescale_percentage_boxes(value: &mut Value) -> bool {
    let Some(findings) = value.get_mut("findings").and_then(Value::as_array_mut) else {
        return false;
    };

    let mut changed = false;
    for finding in findings {
        let Some(coords) = finding.get_mut("boundingBox").and_then(Value::as_array_mut) else {
            continue;
        };
        let numbers: Option<Vec<f64>> = coords.iter().map(Value::as_f64).collect();
        let Some(numbers) = numbers else {
            continue;
        };
        if looks_like_percent_box(&numbers) {
            *coords = numbers.iter().map(|c| Value::from(c / 100.0)).collect();
            changed = true;
        }
    }
    changed
}

fn looks_like_percent_box(coords: &[f64]) -> bool {
    let [_, _, x_max, y_max] = coords else {
        return false;
    };
    coords.iter().all(|c| (0.0..=100.0).contains(c))
        && *x_max > 1.0
        && *y_max > 1.0
        && !coords.iter().any(|c| *c > 0.0 && *c < 1.0)
}
