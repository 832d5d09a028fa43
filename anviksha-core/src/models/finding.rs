//! Finding Model
//!
//! One discrete clinical observation extracted from an image.

use serde::{Deserialize, Serialize};

/// Anatomical category of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Pulmonary,
    Cardiac,
    Skeletal,
    Other,
}

impl Category {
    /// Every category, in schema order
    pub const ALL: [Category; 4] = [
        Category::Pulmonary,
        Category::Cardiac,
        Category::Skeletal,
        Category::Other,
    ];

    /// Wire name used in the JSON report
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Pulmonary => "Pulmonary",
            Category::Cardiac => "Cardiac",
            Category::Skeletal => "Skeletal",
            Category::Other => "Other",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Invalid category: '{s}'. Valid options: Pulmonary, Cardiac, Skeletal, Other"))
    }
}

/// Clinical urgency of a finding, ordered `Low < Medium < High < Critical`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Every severity, least urgent first
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    /// Wire name used in the JSON report
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Critical => "Critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Severity::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Invalid severity: '{s}'. Valid options: Low, Medium, High, Critical"))
    }
}

/// Normalized rectangle `[x_min, y_min, x_max, y_max]`, each coordinate a
/// fraction of the image width or height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoundingBox([f64; 4]);

impl BoundingBox {
    /// Build a bounding box, checking the coordinate invariants
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> crate::Result<Self> {
        let bbox = Self([x_min, y_min, x_max, y_max]);
        bbox.validate()?;
        Ok(bbox)
    }

    pub fn x_min(&self) -> f64 {
        self.0[0]
    }

    pub fn y_min(&self) -> f64 {
        self.0[1]
    }

    pub fn x_max(&self) -> f64 {
        self.0[2]
    }

    pub fn y_max(&self) -> f64 {
        self.0[3]
    }

    /// Raw coordinates in wire order
    pub fn coordinates(&self) -> [f64; 4] {
        self.0
    }

    /// Check every coordinate lies in `[0, 1]` and the box has positive extent
    pub fn validate(&self) -> crate::Result<()> {
        if let Some(bad) = self.0.iter().find(|c| !(0.0..=1.0).contains(*c)) {
            return Err(crate::Error::InvalidResult(format!(
                "bounding box coordinate {bad} outside [0, 1]"
            )));
        }
        if self.x_min() >= self.x_max() {
            return Err(crate::Error::InvalidResult(format!(
                "bounding box x_min {} is not below x_max {}",
                self.x_min(),
                self.x_max()
            )));
        }
        if self.y_min() >= self.y_max() {
            return Err(crate::Error::InvalidResult(format!(
                "bounding box y_min {} is not below y_max {}",
                self.y_min(),
                self.y_max()
            )));
        }
        Ok(())
    }
}

/// One clinical observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    /// Name of the observed condition
    pub condition: String,
    pub category: Category,
    pub severity: Severity,
    /// Model confidence in `[0, 1]`
    pub confidence: f64,
    pub description: String,
    pub recommendation: String,
    /// Image region the finding refers to, when the model localized it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
}

impl Finding {
    /// Check confidence bounds and the bounding box, if any
    pub fn validate(&self) -> crate::Result<()> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(crate::Error::InvalidResult(format!(
                "finding '{}' has confidence {} outside [0, 1]",
                self.condition, self.confidence
            )));
        }
        if let Some(bbox) = &self.bounding_box {
            bbox.validate().map_err(|e| {
                crate::Error::InvalidResult(format!("finding '{}': {e}", self.condition))
            })?;
        }
        Ok(())
    }

    /// Whether this finding reports tuberculosis
    pub fn is_tuberculosis(&self) -> bool {
        let condition = self.condition.to_lowercase();
        condition.contains("tuberculosis")
            || condition
                .split(|c: char| !c.is_alphanumeric())
                .any(|word| word == "tb")
    }

    /// Confidence as a whole percentage for display
    pub fn confidence_percent(&self) -> u8 {
        // Bounded by validate()
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let pct = (self.confidence.clamp(0.0, 1.0) * 100.0).round() as u8;
        pct
    }
}
