//! Skin tone analysis pipeline.
//!
//! Capture frame in, [`SkinToneAnalysis`] out: region selection (fixed or
//! landmark-driven), outlier filtering and aggregation, lighting gate,
//! Lab conversion and classification. One analysis per still frame; the
//! most recent results are kept in a bounded rolling history.

mod classifier;
mod color_space;
mod detector;
mod history;
mod lighting;
mod regions;

pub use classifier::{
    fitzpatrick_for, seasons_for, ClassifierThresholds, FitzpatrickType, Lightness,
    SkinToneClassifier, ToneClassification, Undertone,
};
pub use color_space::{lab_to_srgb, srgb_to_lab, LabMeasurement};
pub use detector::{
    DetectorCell, DetectorError, FaceDetector, FaceLandmarks, Keypoint, RetryPolicy,
    StaticLandmarkDetector, FOREHEAD_INDEX, LEFT_CHEEK_INDEX, RIGHT_CHEEK_INDEX,
};
pub use history::{AnalysisHistory, DEFAULT_HISTORY_LIMIT};
pub use lighting::{classify_lighting, LightingCondition, BRIGHT_THRESHOLD, DARK_THRESHOLD};
pub use regions::{
    aggregate_regions, fixed_layout, regions_from_landmarks, RegionAggregate, SampleRegion,
    SampleRegionSelector, MAX_PIXEL_BRIGHTNESS, MIN_PIXEL_BRIGHTNESS,
};

#[cfg(feature = "mock")]
pub use detector::MockFaceDetector;

use chrono::{DateTime, Utc};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;
use tracing::info;

use crate::catalog::Season;

/// Errors from the classification pipeline. All recoverable: the request
/// boundary converts them into user-visible advisories.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("no face detected after {attempts} attempts: {source}")]
    NoFaceDetected {
        attempts: u32,
        #[source]
        source: DetectorError,
    },

    #[error("required facial landmarks not found")]
    LandmarksNotFound,

    #[error("could not sample enough skin pixels from the capture frame")]
    InsufficientSamples,
}

/// Averaged capture color, rounded to display channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RgbValues {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Per-analysis timing and sampling figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    /// Wall-clock duration of the analysis in milliseconds.
    pub analysis_time_ms: f64,
    pub lighting_condition: LightingCondition,
    /// Eligible pixels aggregated across regions.
    pub sample_size: usize,
    /// Regions that contributed at least one eligible pixel.
    pub valid_samples: usize,
}

/// The immutable result of one capture analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkinToneAnalysis {
    pub undertone: Undertone,
    pub lightness: Lightness,
    pub fitzpatrick_type: FitzpatrickType,
    /// Ranked season recommendations, primary first. Never empty.
    pub seasons: Vec<Season>,
    pub lab_values: LabMeasurement,
    pub rgb_values: RgbValues,
    pub light_condition: LightingCondition,
    pub timestamp: DateTime<Utc>,
    pub performance_metrics: PerformanceMetrics,
}

impl SkinToneAnalysis {
    /// The season driving shade recommendations.
    pub fn primary_season(&self) -> Season {
        self.seasons[0]
    }
}

/// Orchestrates the full pipeline for still-frame captures.
pub struct SkinToneAnalyzer {
    selector: SampleRegionSelector,
    classifier: SkinToneClassifier,
    history: AnalysisHistory,
}

impl SkinToneAnalyzer {
    pub fn new(selector: SampleRegionSelector, classifier: SkinToneClassifier) -> Self {
        Self {
            selector,
            classifier,
            history: AnalysisHistory::default(),
        }
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history = AnalysisHistory::with_limit(limit);
        self
    }

    /// Analyze one capture frame.
    ///
    /// Sequential within the request: select regions (may suspend on
    /// detection retries), aggregate, gate lighting, convert, classify.
    pub async fn analyze(&mut self, frame: &RgbImage) -> Result<SkinToneAnalysis, AnalysisError> {
        let started = Instant::now();

        let sample_regions = self.selector.select_regions(frame).await?;
        let aggregate = aggregate_regions(frame, &sample_regions)?;

        let light_condition = classify_lighting(aggregate.mean_brightness);
        let lab_values = srgb_to_lab(aggregate.mean_r, aggregate.mean_g, aggregate.mean_b);
        let classification = self.classifier.classify(&lab_values);

        let analysis = SkinToneAnalysis {
            undertone: classification.undertone,
            lightness: classification.lightness,
            fitzpatrick_type: classification.fitzpatrick_type,
            seasons: classification.seasons,
            lab_values,
            rgb_values: RgbValues {
                r: aggregate.mean_r.round() as u8,
                g: aggregate.mean_g.round() as u8,
                b: aggregate.mean_b.round() as u8,
            },
            light_condition,
            timestamp: Utc::now(),
            performance_metrics: PerformanceMetrics {
                analysis_time_ms: started.elapsed().as_secs_f64() * 1000.0,
                lighting_condition: light_condition,
                sample_size: aggregate.sample_size,
                valid_samples: aggregate.sampled_regions,
            },
        };

        info!(
            undertone = ?analysis.undertone,
            lightness = ?analysis.lightness,
            primary_season = %analysis.primary_season(),
            light = ?light_condition,
            sample_size = aggregate.sample_size,
            "analysis complete"
        );

        self.history.push(analysis.clone());
        Ok(analysis)
    }

    pub fn history(&self) -> &AnalysisHistory {
        &self.history
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::Rgb;

    /// A minimal analysis document for history tests; only `lab_values.l`
    /// varies.
    pub(crate) fn sample_analysis(l: f64) -> SkinToneAnalysis {
        SkinToneAnalysis {
            undertone: Undertone::Neutral,
            lightness: Lightness::Medium,
            fitzpatrick_type: FitzpatrickType::III,
            seasons: vec![Season::Autumn, Season::Winter],
            lab_values: LabMeasurement { l, a: 5.0, b: 8.0 },
            rgb_values: RgbValues {
                r: 180,
                g: 140,
                b: 120,
            },
            light_condition: LightingCondition::Good,
            timestamp: Utc::now(),
            performance_metrics: PerformanceMetrics {
                analysis_time_ms: 1.0,
                lighting_condition: LightingCondition::Good,
                sample_size: 100,
                valid_samples: 3,
            },
        }
    }

    fn skin_frame() -> RgbImage {
        // Uniform light warm skin tone across the whole capture.
        RgbImage::from_pixel(640, 480, Rgb([231, 180, 160]))
    }

    #[tokio::test]
    async fn analyze_produces_a_full_document() {
        let mut analyzer = SkinToneAnalyzer::new(
            SampleRegionSelector::fixed(),
            SkinToneClassifier::default(),
        );
        let analysis = analyzer.analyze(&skin_frame()).await.unwrap();

        assert_eq!(analysis.rgb_values, RgbValues { r: 231, g: 180, b: 160 });
        assert_eq!(analysis.light_condition, LightingCondition::Bright);
        assert!(analysis.lab_values.l > 70.0);
        assert!(!analysis.seasons.is_empty());
        assert_eq!(analysis.performance_metrics.valid_samples, 3);
        assert_eq!(analyzer.history().len(), 1);
    }

    #[tokio::test]
    async fn analyze_fails_on_all_dark_frame() {
        let frame = RgbImage::from_pixel(640, 480, Rgb([4, 4, 4]));
        let mut analyzer = SkinToneAnalyzer::new(
            SampleRegionSelector::fixed(),
            SkinToneClassifier::default(),
        );
        assert!(matches!(
            analyzer.analyze(&frame).await,
            Err(AnalysisError::InsufficientSamples)
        ));
    }

    #[tokio::test]
    async fn history_accumulates_across_analyses() {
        let mut analyzer = SkinToneAnalyzer::new(
            SampleRegionSelector::fixed(),
            SkinToneClassifier::default(),
        )
        .with_history_limit(2);
        let frame = skin_frame();
        for _ in 0..3 {
            analyzer.analyze(&frame).await.unwrap();
        }
        assert_eq!(analyzer.history().len(), 2);
    }

    #[test]
    fn analysis_serializes_with_camel_case_wire_names() {
        let json = serde_json::to_value(sample_analysis(55.0)).unwrap();
        assert!(json.get("labValues").is_some());
        assert!(json.get("rgbValues").is_some());
        assert!(json.get("lightCondition").is_some());
        assert!(json.get("fitzpatrickType").is_some());
        assert_eq!(json["fitzpatrickType"], "Type III");
        assert_eq!(json["labValues"]["L"], 55.0);
        assert_eq!(
            json["performanceMetrics"]["validSamples"],
            serde_json::json!(3)
        );
    }
}
