//! Analysis Result Model
//!
//! The full report for one analyzed image, in the exact shape the model
//! provider is asked to return.

use serde::{Deserialize, Serialize};

use super::finding::{Finding, Severity};

/// Assessment used for the safe terminal result when every model failed
pub const EXHAUSTED_ASSESSMENT: &str = "An error occurred during analysis. The AI model could not \
process the request after multiple attempts. This might be due to a safety policy violation, an \
invalid image, or a network issue. Please try again with a different image.";

/// Complete analysis report for a single image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Concise professional summary of all findings
    pub overall_assessment: String,
    pub is_tuberculosis_detected: bool,
    /// Detailed TB report, only meaningful when TB was detected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuberculosis_report: Option<String>,
    /// Key findings, possibly empty
    #[serde(default)]
    pub findings: Vec<Finding>,
}

impl AnalysisResult {
    /// The well-formed empty report returned when every model attempt failed
    pub fn exhausted() -> Self {
        Self {
            overall_assessment: EXHAUSTED_ASSESSMENT.to_string(),
            is_tuberculosis_detected: false,
            tuberculosis_report: None,
            findings: Vec::new(),
        }
    }

    /// Check the invariants every successful report must satisfy
    pub fn validate(&self) -> crate::Result<()> {
        if self.overall_assessment.trim().is_empty() {
            return Err(crate::Error::InvalidResult(
                "overallAssessment is empty".to_string(),
            ));
        }
        if !self.is_tuberculosis_detected && self.tuberculosis_report.is_some() {
            return Err(crate::Error::InvalidResult(
                "tuberculosisReport present while isTuberculosisDetected is false".to_string(),
            ));
        }
        for finding in &self.findings {
            finding.validate()?;
        }
        Ok(())
    }

    /// Drop a TB report the model attached to a TB-negative result.
    ///
    /// Returns `true` when a report was removed.
    pub fn discard_stray_tuberculosis_report(&mut self) -> bool {
        if self.is_tuberculosis_detected {
            return false;
        }
        self.tuberculosis_report.take().is_some()
    }

    /// The finding describing tuberculosis, if the model listed one
    pub fn tuberculosis_finding(&self) -> Option<&Finding> {
        self.findings.iter().find(|f| f.is_tuberculosis())
    }

    /// Cross-field inconsistencies the prompt asks the model to avoid.
    ///
    /// These are not enforced; callers may surface them as warnings.
    pub fn consistency_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        let tb_findings = self.findings.iter().filter(|f| f.is_tuberculosis()).count();

        if self.is_tuberculosis_detected {
            match tb_findings {
                0 => issues.push("tuberculosis detected but not listed in findings".to_string()),
                1 => {}
                n => issues.push(format!("tuberculosis listed {n} times in findings")),
            }
            if self
                .tuberculosis_report
                .as_deref()
                .map_or(true, |r| r.trim().is_empty())
            {
                issues.push("tuberculosis detected without a tuberculosis report".to_string());
            }
        } else if tb_findings > 0 {
            issues.push("tuberculosis finding present but isTuberculosisDetected is false".to_string());
        }

        issues
    }

    /// Findings ordered by descending urgency, stable within a severity
    pub fn findings_by_urgency(&self) -> Vec<&Finding> {
        let mut ordered: Vec<&Finding> = self.findings.iter().collect();
        ordered.sort_by(|a, b| b.severity.cmp(&a.severity));
        ordered
    }

    /// Most urgent severity among the findings
    pub fn highest_severity(&self) -> Option<Severity> {
        self.findings.iter().map(|f| f.severity).max()
    }
}
