mod file_config;

pub use file_config::{ClassifierConfig, DetectionConfig, DispenserConfig, FileConfig};

use anyhow::{bail, Result};
use std::time::Duration;

use crate::analysis::{ClassifierThresholds, RetryPolicy};
use crate::dispenser::DEFAULT_SETTLE_DELAY;

/// Default rig bridge websocket endpoint.
pub const DEFAULT_RIG_URL: &str = "ws://localhost:8000/ws";

/// Default catalog store base URL.
pub const DEFAULT_CATALOG_URL: &str = "http://localhost:5001/api";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub rig_url: Option<String>,
    pub catalog_url: Option<String>,
    pub catalog_timeout_sec: u64,
    pub history_limit: usize,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            rig_url: None,
            catalog_url: None,
            catalog_timeout_sec: 10,
            history_limit: 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub rig_url: String,
    pub catalog_url: String,
    pub catalog_timeout_sec: u64,
    pub history_limit: usize,
    pub thresholds: ClassifierThresholds,
    pub detection_retry: RetryPolicy,
    pub settle_delay: Duration,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let rig_url = file
            .rig_url
            .or_else(|| cli.rig_url.clone())
            .unwrap_or_else(|| DEFAULT_RIG_URL.to_string());
        let catalog_url = file
            .catalog_url
            .or_else(|| cli.catalog_url.clone())
            .unwrap_or_else(|| DEFAULT_CATALOG_URL.to_string());
        let catalog_timeout_sec = file.catalog_timeout_sec.unwrap_or(cli.catalog_timeout_sec);
        let history_limit = file.history_limit.unwrap_or(cli.history_limit);

        // Classifier thresholds: preset regime first, explicit cutoffs on top.
        let classifier_file = file.classifier.unwrap_or_default();
        let mut thresholds = match classifier_file.regime.as_deref() {
            None | Some("coarse") => ClassifierThresholds::default(),
            Some("refined") => ClassifierThresholds::refined(),
            Some(other) => bail!("Unknown classifier regime: {}", other),
        };
        if let Some(warm_hue) = classifier_file.warm_hue {
            thresholds.warm_hue = warm_hue;
        }
        if let Some(cool_hue) = classifier_file.cool_hue {
            thresholds.cool_hue = cool_hue;
        }
        if let Some(high_lightness) = classifier_file.high_lightness {
            thresholds.high_lightness = high_lightness;
        }
        if let Some(mid_lightness) = classifier_file.mid_lightness {
            thresholds.mid_lightness = mid_lightness;
        }
        if thresholds.cool_hue > thresholds.warm_hue {
            bail!(
                "cool_hue ({}) must not exceed warm_hue ({})",
                thresholds.cool_hue,
                thresholds.warm_hue
            );
        }

        let detection_file = file.detection.unwrap_or_default();
        let detection_defaults = RetryPolicy::default();
        let detection_retry = RetryPolicy::new(
            detection_file
                .max_attempts
                .unwrap_or(detection_defaults.max_attempts),
            detection_file
                .backoff_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(detection_defaults.backoff_delay),
        );

        let dispenser_file = file.dispenser.unwrap_or_default();
        let settle_delay = dispenser_file
            .settle_delay_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_SETTLE_DELAY);

        Ok(Self {
            rig_url,
            catalog_url,
            catalog_timeout_sec,
            history_limit,
            thresholds,
            detection_retry,
            settle_delay,
        })
    }
}
