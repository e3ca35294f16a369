use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub rig_url: Option<String>,
    pub catalog_url: Option<String>,
    pub catalog_timeout_sec: Option<u64>,
    pub history_limit: Option<usize>,

    // Feature configs
    pub classifier: Option<ClassifierConfig>,
    pub detection: Option<DetectionConfig>,
    pub dispenser: Option<DispenserConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Threshold regime preset: "coarse" or "refined". Individual
    /// cutoffs below override the preset.
    pub regime: Option<String>,
    pub warm_hue: Option<f64>,
    pub cool_hue: Option<f64>,
    pub high_lightness: Option<f64>,
    pub mid_lightness: Option<f64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct DetectionConfig {
    pub max_attempts: Option<u32>,
    pub backoff_delay_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct DispenserConfig {
    pub settle_delay_ms: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
