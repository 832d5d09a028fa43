//! Human-readable and JSON rendering of analysis outcomes

use anviksha_core::AnalysisResult;
use anviksha_llm::{AnalysisError, AnalysisReport};
use serde_json::{json, Value};
use std::fmt::Write as _;
use std::path::Path;

pub fn report_text(image: &Path, report: &AnalysisReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Image: {}", image.display());
    match &report.model {
        Some(model) => {
            let _ = writeln!(out, "Model: {model}");
        }
        None => {
            let _ = writeln!(out, "Model: none (all {} attempts failed)", report.failed_attempts.len());
        }
    }
    out.push_str(&result_text(&report.result));
    out
}

pub fn result_text(result: &AnalysisResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\nOverall assessment:\n  {}", result.overall_assessment);

    if result.is_tuberculosis_detected {
        let _ = writeln!(out, "\nTuberculosis: DETECTED");
        if let Some(report) = &result.tuberculosis_report {
            let _ = writeln!(out, "  {report}");
        }
    } else {
        let _ = writeln!(out, "\nTuberculosis: not detected");
    }

    if result.findings.is_empty() {
        let _ = writeln!(out, "\nFindings: none");
        return out;
    }

    let _ = write!(out, "\nFindings ({}", result.findings.len());
    if let Some(severity) = result.highest_severity() {
        let _ = write!(out, ", most severe: {severity}");
    }
    let _ = writeln!(out, "):");
    for (i, finding) in result.findings_by_urgency().into_iter().enumerate() {
        let _ = writeln!(
            out,
            "  {}. [{}] {} ({}), confidence {}%",
            i + 1,
            finding.severity,
            finding.condition,
            finding.category,
            finding.confidence_percent()
        );
        let _ = writeln!(out, "     {}", finding.description);
        let _ = writeln!(out, "     Recommendation: {}", finding.recommendation);
        if let Some(bbox) = finding.bounding_box {
            let _ = writeln!(
                out,
                "     Region: x {:.2}-{:.2}, y {:.2}-{:.2}",
                bbox.x_min(),
                bbox.x_max(),
                bbox.y_min(),
                bbox.y_max()
            );
        }
    }
    out
}

pub fn failure_text(image: &Path, error: &AnalysisError) -> String {
    format!("{}: {}\n  {}", error.headline(), image.display(), error.detail())
}

pub fn report_json(image: &Path, report: &AnalysisReport) -> Value {
    json!({
        "image": image.display().to_string(),
        "status": "ok",
        "report": report,
    })
}

pub fn failure_json(image: &Path, error: &AnalysisError) -> Value {
    json!({
        "image": image.display().to_string(),
        "status": "failed",
        "error": {
            "kind": error.kind(),
            "headline": error.headline(),
            "detail": error.detail(),
            "attempts": error.attempts(),
        }
    })
}
