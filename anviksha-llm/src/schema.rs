//! Output schemas
//!
//! Two renderings of the same report shape: the OpenAPI-style schema the
//! provider uses to constrain generation, and a draft-07 JSON Schema used to
//! validate what comes back.

use anviksha_core::{Category, Severity};
use serde_json::{json, Value};

fn category_names() -> Vec<&'static str> {
    Category::ALL.iter().map(|c| c.as_str()).collect()
}

fn severity_names() -> Vec<&'static str> {
    Severity::ALL.iter().map(|s| s.as_str()).collect()
}

/// Required properties of each finding
pub const FINDING_REQUIRED: [&str; 6] = [
    "condition",
    "category",
    "severity",
    "confidence",
    "description",
    "recommendation",
];

/// Schema attached to the generation request as `responseSchema`
pub fn provider_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "overallAssessment": { "type": "STRING" },
            "isTuberculosisDetected": { "type": "BOOLEAN" },
            "tuberculosisReport": { "type": "STRING", "nullable": true },
            "findings": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "condition": { "type": "STRING" },
                        "category": {
                            "type": "STRING",
                            "format": "enum",
                            "enum": category_names(),
                        },
                        "severity": {
                            "type": "STRING",
                            "format": "enum",
                            "enum": severity_names(),
                        },
                        "confidence": {
                            "type": "NUMBER",
                            "description": "Confidence score from 0.0 to 1.0."
                        },
                        "description": { "type": "STRING" },
                        "recommendation": { "type": "STRING" },
                        "boundingBox": {
                            "type": "ARRAY",
                            "items": { "type": "NUMBER" },
                            "nullable": true,
                            "description": "[x_min, y_min, x_max, y_max] as fractions of the image width and height."
                        }
                    },
                    "required": FINDING_REQUIRED,
                }
            }
        },
        "required": ["overallAssessment", "isTuberculosisDetected", "tuberculosisReport", "findings"]
    })
}

/// JSON Schema every provider reply must satisfy
pub fn validation_schema() -> Value {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "required": ["overallAssessment", "isTuberculosisDetected", "findings"],
        "properties": {
            "overallAssessment": { "type": "string", "minLength": 1 },
            "isTuberculosisDetected": { "type": "boolean" },
            "tuberculosisReport": { "type": ["string", "null"] },
            "findings": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": FINDING_REQUIRED,
                    "properties": {
                        "condition": { "type": "string" },
                        "category": { "enum": category_names() },
                        "severity": { "enum": severity_names() },
                        "confidence": { "type": "number", "minimum": 0, "maximum": 1 },
                        "description": { "type": "string" },
                        "recommendation": { "type": "string" },
                        "boundingBox": {
                            "type": ["array", "null"],
                            "items": { "type": "number", "minimum": 0, "maximum": 1 },
                            "minItems": 4,
                            "maxItems": 4
                        }
                    }
                }
            }
        }
    })
}
