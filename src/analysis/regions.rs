//! Sample region selection and pixel aggregation.
//!
//! Two operating modes: a fixed three-rectangle layout used when no
//! landmark capability is available, and a landmark-driven mode that
//! centers one square region on each facial anchor point. Pixel
//! aggregation filters shadow/reflection outliers before averaging.

use image::RgbImage;
use std::sync::Arc;
use tracing::{debug, warn};

use super::detector::{
    DetectorCell, RetryPolicy, FOREHEAD_INDEX, LEFT_CHEEK_INDEX, RIGHT_CHEEK_INDEX,
};
use super::AnalysisError;

/// Reference capture dimensions the fixed layout was designed for.
pub const REFERENCE_WIDTH: u32 = 640;
pub const REFERENCE_HEIGHT: u32 = 480;

/// Per-pixel brightness bounds; pixels outside are treated as shadow or
/// reflection outliers and excluded from aggregation.
pub const MIN_PIXEL_BRIGHTNESS: f64 = 20.0;
pub const MAX_PIXEL_BRIGHTNESS: f64 = 240.0;

/// Sample edge length as a fraction of the face bounding box short side.
const LANDMARK_SAMPLE_FRACTION: f64 = 0.15;

/// Axis-aligned sample rectangle in capture-pixel coordinates.
///
/// Always fully contained within capture bounds with non-zero area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl SampleRegion {
    /// Build a region centered on a point, clamped to the capture bounds.
    /// Returns None when the clamped rectangle has no area.
    pub fn centered(
        cx: f64,
        cy: f64,
        edge: f64,
        frame_width: u32,
        frame_height: u32,
    ) -> Option<Self> {
        let x0 = (cx - edge / 2.0).max(0.0);
        let y0 = (cy - edge / 2.0).max(0.0);
        let x1 = (cx + edge / 2.0).min(frame_width as f64);
        let y1 = (cy + edge / 2.0).min(frame_height as f64);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        let x = x0.round() as u32;
        let y = y0.round() as u32;
        let width = (x1.round() as u32).saturating_sub(x);
        let height = (y1.round() as u32).saturating_sub(y);
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self {
            x,
            y,
            width,
            height,
        })
    }
}

/// The fixed fallback layout: center, left and right rectangles, scaled
/// from the 640x480 reference to the actual capture dimensions.
pub fn fixed_layout(frame_width: u32, frame_height: u32) -> Vec<SampleRegion> {
    let sx = frame_width as f64 / REFERENCE_WIDTH as f64;
    let sy = frame_height as f64 / REFERENCE_HEIGHT as f64;
    let reference = [
        (270.0, 190.0, 100.0, 100.0), // center
        (220.0, 190.0, 50.0, 50.0),   // left
        (370.0, 190.0, 50.0, 50.0),   // right
    ];
    reference
        .iter()
        .filter_map(|&(x, y, w, h)| {
            SampleRegion::centered(
                (x + w / 2.0) * sx,
                (y + h / 2.0) * sy,
                (w * sx).min(h * sy),
                frame_width,
                frame_height,
            )
        })
        .collect()
}

/// Compute one square region per facial anchor (forehead, left cheek,
/// right cheek) from a detected landmark set.
pub fn regions_from_landmarks(
    landmarks: &super::detector::FaceLandmarks,
    frame_width: u32,
    frame_height: u32,
) -> Result<Vec<SampleRegion>, AnalysisError> {
    let (x_min, y_min, x_max, y_max) = landmarks
        .bounding_box()
        .ok_or(AnalysisError::LandmarksNotFound)?;
    let edge = LANDMARK_SAMPLE_FRACTION * (x_max - x_min).min(y_max - y_min);

    let forehead = landmarks
        .anchor(FOREHEAD_INDEX, "foreheadCenter")
        .ok_or(AnalysisError::LandmarksNotFound)?;
    let left_cheek = landmarks
        .anchor(LEFT_CHEEK_INDEX, "leftCheek")
        .ok_or(AnalysisError::LandmarksNotFound)?;
    let right_cheek = landmarks
        .anchor(RIGHT_CHEEK_INDEX, "rightCheek")
        .ok_or(AnalysisError::LandmarksNotFound)?;

    let regions: Vec<SampleRegion> = [forehead, left_cheek, right_cheek]
        .iter()
        .filter_map(|k| SampleRegion::centered(k.x, k.y, edge, frame_width, frame_height))
        .collect();

    if regions.is_empty() {
        return Err(AnalysisError::LandmarksNotFound);
    }
    Ok(regions)
}

/// Aggregated channel averages over the eligible pixels of the sampled
/// regions.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionAggregate {
    pub mean_r: f64,
    pub mean_g: f64,
    pub mean_b: f64,
    /// Mean of per-pixel brightness `(r+g+b)/3` over eligible pixels.
    pub mean_brightness: f64,
    /// Number of eligible pixels across all regions.
    pub sample_size: usize,
    /// Number of regions that contributed at least one eligible pixel.
    pub sampled_regions: usize,
}

/// Average the eligible pixels of each region.
///
/// A region with zero eligible pixels is skipped; if every region is
/// empty the aggregation fails with [`AnalysisError::InsufficientSamples`].
pub fn aggregate_regions(
    frame: &RgbImage,
    regions: &[SampleRegion],
) -> Result<RegionAggregate, AnalysisError> {
    let mut total_r = 0.0;
    let mut total_g = 0.0;
    let mut total_b = 0.0;
    let mut total_brightness = 0.0;
    let mut total_pixels = 0usize;
    let mut sampled_regions = 0usize;

    for region in regions {
        let mut region_pixels = 0usize;
        for y in region.y..region.y + region.height {
            for x in region.x..region.x + region.width {
                let pixel = frame.get_pixel(x, y);
                let (r, g, b) = (pixel[0] as f64, pixel[1] as f64, pixel[2] as f64);
                let brightness = (r + g + b) / 3.0;
                if !(MIN_PIXEL_BRIGHTNESS..=MAX_PIXEL_BRIGHTNESS).contains(&brightness) {
                    continue;
                }
                total_r += r;
                total_g += g;
                total_b += b;
                total_brightness += brightness;
                region_pixels += 1;
            }
        }
        if region_pixels > 0 {
            sampled_regions += 1;
            total_pixels += region_pixels;
        } else {
            debug!(?region, "sample region yielded no eligible pixels, skipping");
        }
    }

    if sampled_regions == 0 || total_pixels == 0 {
        return Err(AnalysisError::InsufficientSamples);
    }

    let n = total_pixels as f64;
    Ok(RegionAggregate {
        mean_r: total_r / n,
        mean_g: total_g / n,
        mean_b: total_b / n,
        mean_brightness: total_brightness / n,
        sample_size: total_pixels,
        sampled_regions,
    })
}

/// Selects the pixel regions to sample for one analysis.
///
/// Polymorphic over the available capability set: with a detector the
/// selector is landmark-driven with bounded detection retries; without
/// one it falls back to the fixed layout.
pub struct SampleRegionSelector {
    detector: Option<Arc<DetectorCell>>,
    retry: RetryPolicy,
}

impl SampleRegionSelector {
    /// Fixed-layout mode; no detection capability required.
    pub fn fixed() -> Self {
        Self {
            detector: None,
            retry: RetryPolicy::default(),
        }
    }

    /// Landmark-driven mode backed by the given detector cell.
    pub fn landmark_driven(detector: Arc<DetectorCell>, retry: RetryPolicy) -> Self {
        Self {
            detector: Some(detector),
            retry,
        }
    }

    pub fn is_landmark_driven(&self) -> bool {
        self.detector.is_some()
    }

    pub async fn select_regions(
        &self,
        frame: &RgbImage,
    ) -> Result<Vec<SampleRegion>, AnalysisError> {
        let Some(cell) = &self.detector else {
            return Ok(fixed_layout(frame.width(), frame.height()));
        };

        let detection = self
            .retry
            .run(|| {
                let cell = Arc::clone(cell);
                async move {
                    let detector = cell.get().await?;
                    let landmarks = detector.detect(frame).await?;
                    if landmarks.keypoints.is_empty() {
                        return Err(super::detector::DetectorError::NoFace);
                    }
                    Ok(landmarks)
                }
            })
            .await;

        let landmarks = match detection {
            Ok(landmarks) => landmarks,
            Err(source) => {
                warn!(attempts = self.retry.max_attempts, error = %source, "face detection failed");
                return Err(AnalysisError::NoFaceDetected {
                    attempts: self.retry.max_attempts.max(1),
                    source,
                });
            }
        };

        regions_from_landmarks(&landmarks, frame.width(), frame.height())
    }
}
