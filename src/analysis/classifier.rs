//! Skin tone classification.
//!
//! Derives undertone, lightness tier, Fitzpatrick tier and ranked season
//! recommendations from a Lab measurement. All cutoffs live in
//! [`ClassifierThresholds`] so the two historical regimes stay selectable
//! through configuration.

use serde::{Deserialize, Serialize};

use super::color_space::LabMeasurement;
use crate::catalog::Season;

/// Warm/cool/neutral classification of skin hue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Undertone {
    Warm,
    Cool,
    Neutral,
}

/// Coarse lightness tier derived from L*.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lightness {
    High,
    Medium,
    Low,
}

/// Six-level ordinal skin-lightness scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FitzpatrickType {
    #[serde(rename = "Type I")]
    I,
    #[serde(rename = "Type II")]
    II,
    #[serde(rename = "Type III")]
    III,
    #[serde(rename = "Type IV")]
    IV,
    #[serde(rename = "Type V")]
    V,
    #[serde(rename = "Type VI")]
    VI,
}

impl std::fmt::Display for FitzpatrickType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            FitzpatrickType::I => "Type I",
            FitzpatrickType::II => "Type II",
            FitzpatrickType::III => "Type III",
            FitzpatrickType::IV => "Type IV",
            FitzpatrickType::V => "Type V",
            FitzpatrickType::VI => "Type VI",
        };
        f.write_str(label)
    }
}

/// Classification cutoffs.
///
/// The default is the coarse regime (65°/55° hue split with a true Neutral
/// band, 70/50 lightness split). The refined regime (single 60° split,
/// 66/45 lightness) is available via [`ClassifierThresholds::refined`] or
/// through configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierThresholds {
    /// Hue angle above which the undertone is Warm.
    pub warm_hue: f64,
    /// Hue angle below which the undertone is Cool.
    pub cool_hue: f64,
    /// L* above which lightness is High.
    pub high_lightness: f64,
    /// L* above which lightness is Medium (Low below).
    pub mid_lightness: f64,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            warm_hue: 65.0,
            cool_hue: 55.0,
            high_lightness: 70.0,
            mid_lightness: 50.0,
        }
    }
}

impl ClassifierThresholds {
    /// The refined regime: single 60° hue split (no Neutral band) and
    /// lower lightness cutoffs.
    pub fn refined() -> Self {
        Self {
            warm_hue: 60.0,
            cool_hue: 60.0,
            high_lightness: 66.0,
            mid_lightness: 45.0,
        }
    }
}

/// Full classification result for one measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct ToneClassification {
    pub undertone: Undertone,
    pub lightness: Lightness,
    pub fitzpatrick_type: FitzpatrickType,
    /// Ranked season recommendations, primary first. Never empty.
    pub seasons: Vec<Season>,
}

/// Classifies Lab measurements into tone labels. Stateless apart from the
/// configured thresholds; always produces a result for valid Lab input.
#[derive(Debug, Clone, Default)]
pub struct SkinToneClassifier {
    thresholds: ClassifierThresholds,
}

impl SkinToneClassifier {
    pub fn new(thresholds: ClassifierThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &ClassifierThresholds {
        &self.thresholds
    }

    pub fn classify(&self, lab: &LabMeasurement) -> ToneClassification {
        let undertone = self.undertone_for(lab.hue_angle());
        let lightness = self.lightness_for(lab.l);
        ToneClassification {
            undertone,
            lightness,
            fitzpatrick_type: fitzpatrick_for(lab.l),
            seasons: seasons_for(undertone, lightness),
        }
    }

    fn undertone_for(&self, hue_angle: f64) -> Undertone {
        if hue_angle > self.thresholds.warm_hue {
            Undertone::Warm
        } else if hue_angle < self.thresholds.cool_hue {
            Undertone::Cool
        } else {
            Undertone::Neutral
        }
    }

    fn lightness_for(&self, l: f64) -> Lightness {
        if l > self.thresholds.high_lightness {
            Lightness::High
        } else if l > self.thresholds.mid_lightness {
            Lightness::Medium
        } else {
            Lightness::Low
        }
    }
}

/// Fitzpatrick tier from L*. Not threshold-configurable; the scale is fixed.
pub fn fitzpatrick_for(l: f64) -> FitzpatrickType {
    if l > 80.0 {
        FitzpatrickType::I
    } else if l > 70.0 {
        FitzpatrickType::II
    } else if l > 60.0 {
        FitzpatrickType::III
    } else if l > 50.0 {
        FitzpatrickType::IV
    } else if l > 40.0 {
        FitzpatrickType::V
    } else {
        FitzpatrickType::VI
    }
}

/// Season recommendation table keyed by (undertone, lightness == High).
pub fn seasons_for(undertone: Undertone, lightness: Lightness) -> Vec<Season> {
    let high = lightness == Lightness::High;
    match undertone {
        Undertone::Warm if high => vec![Season::Spring, Season::Autumn],
        Undertone::Warm => vec![Season::Autumn],
        Undertone::Cool if high => vec![Season::Summer, Season::Winter],
        Undertone::Cool => vec![Season::Winter],
        Undertone::Neutral if high => vec![Season::Spring, Season::Summer],
        Undertone::Neutral => vec![Season::Autumn, Season::Winter],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lab_with(l: f64, hue_degrees: f64) -> LabMeasurement {
        // Fixed chroma of 10; only the angle matters to the classifier.
        let rad = hue_degrees.to_radians();
        LabMeasurement {
            l,
            a: 10.0 * rad.cos(),
            b: 10.0 * rad.sin(),
        }
    }

    #[test]
    fn warm_high_maps_to_spring_autumn() {
        let classifier = SkinToneClassifier::default();
        let result = classifier.classify(&lab_with(85.0, 70.0));

        assert_eq!(result.undertone, Undertone::Warm);
        assert_eq!(result.lightness, Lightness::High);
        assert_eq!(result.fitzpatrick_type, FitzpatrickType::I);
        assert_eq!(result.seasons, vec![Season::Spring, Season::Autumn]);
    }

    #[test]
    fn cool_medium_maps_to_winter() {
        let classifier = SkinToneClassifier::default();
        let result = classifier.classify(&lab_with(55.0, 50.0));

        assert_eq!(result.undertone, Undertone::Cool);
        assert_eq!(result.lightness, Lightness::Medium);
        assert_eq!(result.fitzpatrick_type, FitzpatrickType::IV);
        assert_eq!(result.seasons, vec![Season::Winter]);
    }

    #[test]
    fn neutral_band_between_cool_and_warm_cutoffs() {
        let classifier = SkinToneClassifier::default();
        assert_eq!(
            classifier.classify(&lab_with(60.0, 60.0)).undertone,
            Undertone::Neutral
        );
        assert_eq!(
            classifier.classify(&lab_with(60.0, 55.0)).undertone,
            Undertone::Neutral
        );
        assert_eq!(
            classifier.classify(&lab_with(60.0, 65.0)).undertone,
            Undertone::Neutral
        );
    }

    #[test]
    fn refined_regime_has_no_neutral_band() {
        let classifier = SkinToneClassifier::new(ClassifierThresholds::refined());
        assert_eq!(
            classifier.classify(&lab_with(60.0, 61.0)).undertone,
            Undertone::Warm
        );
        assert_eq!(
            classifier.classify(&lab_with(60.0, 59.0)).undertone,
            Undertone::Cool
        );
    }

    #[test]
    fn fitzpatrick_tiers_cover_the_l_range() {
        assert_eq!(fitzpatrick_for(85.0), FitzpatrickType::I);
        assert_eq!(fitzpatrick_for(75.0), FitzpatrickType::II);
        assert_eq!(fitzpatrick_for(65.0), FitzpatrickType::III);
        assert_eq!(fitzpatrick_for(55.0), FitzpatrickType::IV);
        assert_eq!(fitzpatrick_for(45.0), FitzpatrickType::V);
        assert_eq!(fitzpatrick_for(35.0), FitzpatrickType::VI);
    }

    #[test]
    fn season_table_is_exhaustive() {
        use Lightness::*;
        use Undertone::*;

        assert_eq!(seasons_for(Warm, High), vec![Season::Spring, Season::Autumn]);
        assert_eq!(seasons_for(Warm, Medium), vec![Season::Autumn]);
        assert_eq!(seasons_for(Warm, Low), vec![Season::Autumn]);
        assert_eq!(
            seasons_for(Cool, High),
            vec![Season::Summer, Season::Winter]
        );
        assert_eq!(seasons_for(Cool, Low), vec![Season::Winter]);
        assert_eq!(
            seasons_for(Neutral, High),
            vec![Season::Spring, Season::Summer]
        );
        assert_eq!(
            seasons_for(Neutral, Medium),
            vec![Season::Autumn, Season::Winter]
        );
    }

    #[test]
    fn fitzpatrick_display_uses_type_labels() {
        assert_eq!(FitzpatrickType::I.to_string(), "Type I");
        assert_eq!(FitzpatrickType::VI.to_string(), "Type VI");
    }

    #[test]
    fn seasons_are_never_empty() {
        for undertone in [Undertone::Warm, Undertone::Cool, Undertone::Neutral] {
            for lightness in [Lightness::High, Lightness::Medium, Lightness::Low] {
                assert!(!seasons_for(undertone, lightness).is_empty());
            }
        }
    }
}
