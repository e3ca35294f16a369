//! Lighting quality gate.
//!
//! Classifies the mean luminance of the sampled pixels into a coarse
//! condition used for advisory feedback. The classification never alters
//! thresholds downstream; it is reported alongside the analysis.

use serde::{Deserialize, Serialize};

/// Mean luminance below this is considered too dark.
pub const DARK_THRESHOLD: f64 = 85.0;

/// Mean luminance above this is considered too bright.
pub const BRIGHT_THRESHOLD: f64 = 170.0;

/// Lighting condition attached to one analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightingCondition {
    Dark,
    Good,
    Bright,
    #[default]
    Unknown,
}

impl LightingCondition {
    /// Advisory message shown to the user for this condition.
    pub fn advice(&self) -> &'static str {
        match self {
            LightingCondition::Dark => {
                "Lighting is too dark. Move to a brighter area for better results."
            }
            LightingCondition::Bright => {
                "Lighting is too bright. Reduce direct light for more accurate results."
            }
            LightingCondition::Good => "Lighting conditions are optimal.",
            LightingCondition::Unknown => "Analyzing lighting conditions...",
        }
    }
}

/// Classify mean luminance (average of `(r+g+b)/3` over sampled pixels).
pub fn classify_lighting(mean_luminance: f64) -> LightingCondition {
    if mean_luminance < DARK_THRESHOLD {
        LightingCondition::Dark
    } else if mean_luminance > BRIGHT_THRESHOLD {
        LightingCondition::Bright
    } else {
        LightingCondition::Good
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_values_classify_correctly() {
        assert_eq!(classify_lighting(84.0), LightingCondition::Dark);
        assert_eq!(classify_lighting(85.0), LightingCondition::Good);
        assert_eq!(classify_lighting(170.0), LightingCondition::Good);
        assert_eq!(classify_lighting(171.0), LightingCondition::Bright);
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&LightingCondition::Dark).unwrap(),
            "\"dark\""
        );
        assert_eq!(
            serde_json::to_string(&LightingCondition::Good).unwrap(),
            "\"good\""
        );
    }

    #[test]
    fn advice_mentions_the_problem() {
        assert!(LightingCondition::Dark.advice().contains("dark"));
        assert!(LightingCondition::Bright.advice().contains("bright"));
    }
}
