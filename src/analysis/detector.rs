//! Face landmark detection boundary.
//!
//! The detection model is an external capability; the pipeline consumes
//! keypoint coordinates through the [`FaceDetector`] trait. The heavyweight
//! model is wrapped in a [`DetectorCell`] so it is initialized exactly once,
//! lazily, and owned explicitly by whoever built the selector instead of
//! living as a process-wide global.

use async_trait::async_trait;
use futures::future::BoxFuture;
use image::RgbImage;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::OnceCell;

/// Mesh index of the left-cheek anchor keypoint.
pub const LEFT_CHEEK_INDEX: usize = 234;
/// Mesh index of the right-cheek anchor keypoint.
pub const RIGHT_CHEEK_INDEX: usize = 454;
/// Mesh index of the forehead-center anchor keypoint.
pub const FOREHEAD_INDEX: usize = 151;

/// A single facial keypoint in capture-pixel coordinates.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Keypoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, name: None }
    }

    pub fn named(x: f64, y: f64, name: impl Into<String>) -> Self {
        Self {
            x,
            y,
            name: Some(name.into()),
        }
    }
}

/// The keypoint set produced by one successful detection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaceLandmarks {
    pub keypoints: Vec<Keypoint>,
}

impl FaceLandmarks {
    pub fn new(keypoints: Vec<Keypoint>) -> Self {
        Self { keypoints }
    }

    /// Bounding box of all keypoints as (x_min, y_min, x_max, y_max).
    /// Returns None when there are no keypoints.
    pub fn bounding_box(&self) -> Option<(f64, f64, f64, f64)> {
        let first = self.keypoints.first()?;
        let mut bounds = (first.x, first.y, first.x, first.y);
        for k in &self.keypoints[1..] {
            bounds.0 = bounds.0.min(k.x);
            bounds.1 = bounds.1.min(k.y);
            bounds.2 = bounds.2.max(k.x);
            bounds.3 = bounds.3.max(k.y);
        }
        Some(bounds)
    }

    /// Look up an anchor keypoint by mesh index, falling back to a named
    /// keypoint when the mesh is sparse.
    pub fn anchor(&self, index: usize, name: &str) -> Option<&Keypoint> {
        self.keypoints
            .get(index)
            .or_else(|| self.keypoints.iter().find(|k| k.name.as_deref() == Some(name)))
    }
}

/// Errors from the detection backend.
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("no face detected in the capture frame")]
    NoFace,

    #[error("detector initialization failed: {0}")]
    Init(String),

    #[error("detector backend failure: {0}")]
    Backend(String),
}

/// Detection capability consumed by the sample region selector.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait FaceDetector: Send + Sync {
    /// Detect facial landmarks in a capture frame.
    ///
    /// Returns [`DetectorError::NoFace`] when the frame contains no
    /// detectable face; other variants indicate backend trouble.
    async fn detect(&self, frame: &RgbImage) -> Result<FaceLandmarks, DetectorError>;
}

/// A detector that always reports the same landmark set.
///
/// Used by tests and by the CLI when keypoints come from an external dump
/// rather than a live model.
#[derive(Debug, Clone, Default)]
pub struct StaticLandmarkDetector {
    landmarks: FaceLandmarks,
}

impl StaticLandmarkDetector {
    pub fn new(landmarks: FaceLandmarks) -> Self {
        Self { landmarks }
    }
}

#[async_trait]
impl FaceDetector for StaticLandmarkDetector {
    async fn detect(&self, _frame: &RgbImage) -> Result<FaceLandmarks, DetectorError> {
        if self.landmarks.keypoints.is_empty() {
            return Err(DetectorError::NoFace);
        }
        Ok(self.landmarks.clone())
    }
}

type DetectorInit =
    Box<dyn Fn() -> BoxFuture<'static, Result<Arc<dyn FaceDetector>, DetectorError>> + Send + Sync>;

/// Lazily-initialized, single-initialization detector holder.
///
/// The inner model is built on first use; concurrent callers share the one
/// initialization. A failed initialization leaves the cell empty so a later
/// call can retry.
pub struct DetectorCell {
    cell: OnceCell<Arc<dyn FaceDetector>>,
    init: DetectorInit,
}

impl DetectorCell {
    pub fn new<F>(init: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, Result<Arc<dyn FaceDetector>, DetectorError>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            cell: OnceCell::new(),
            init: Box::new(init),
        }
    }

    /// Wrap an already-constructed detector.
    pub fn preloaded(detector: Arc<dyn FaceDetector>) -> Self {
        Self {
            cell: OnceCell::new_with(Some(detector)),
            init: Box::new(|| {
                Box::pin(async { Err(DetectorError::Init("detector cell was preloaded".into())) })
            }),
        }
    }

    /// Get the detector, initializing it on first use.
    pub async fn get(&self) -> Result<&Arc<dyn FaceDetector>, DetectorError> {
        self.cell.get_or_try_init(|| (self.init)()).await
    }
}

impl std::fmt::Debug for DetectorCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectorCell")
            .field("initialized", &self.cell.initialized())
            .finish()
    }
}

/// Bounded-attempt retry with a fixed inter-attempt delay.
///
/// Detection can fail transiently while the capture frame stabilizes; the
/// policy pauses between attempts and surfaces the last error once the
/// attempts are exhausted.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_delay: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_delay: Duration) -> Self {
        Self {
            max_attempts,
            backoff_delay,
        }
    }

    /// Run `attempt` until it succeeds or the attempts are exhausted.
    ///
    /// A `max_attempts` of zero is treated as one attempt.
    pub async fn run<T, E, F, Fut>(&self, mut attempt: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut last_error = None;
        for n in 0..attempts {
            if n > 0 {
                tokio::time::sleep(self.backoff_delay).await;
            }
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(e) => last_error = Some(e),
            }
        }
        // The loop ran at least once, so an error is recorded.
        Err(last_error.unwrap())
    }
}
