//! Pipeline configuration.
//!
//! Loaded from a JSON file at startup. Every field has a default, so a partial
//! file (or none at all) is fine.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::telemetry::RecordLayout;

/// How the recognized mission clock is compared to the stop time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StopMode {
    /// Stop when the filtered clock string equals the target exactly
    #[default]
    Exact,
    /// Stop when both strings parse to the same number of seconds
    Numeric,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Process every Nth frame
    pub stride: u64,
    /// Readouts whose brightest channel-mean is below this are blanked before OCR
    pub text_brightness_floor: f32,
    /// Engine circle centres brighter than this count as lit
    pub lit_threshold: f32,
    /// Rise (on the 0-255 normalized gauge profile) marking the fill boundary
    pub gauge_rise_threshold: f32,
    /// Number of instantaneous angles averaged once the window is full
    pub angle_window: usize,
    /// Smoothed angles closer than this to the newest sample snap to it
    pub jitter_degrees: f64,
    /// Worker threads for the per-frame text recognition fan-out
    pub ocr_workers: usize,
    pub tesseract_path: Option<PathBuf>,
    pub tessdata_dir: Option<PathBuf>,
    /// Tesseract page segmentation mode (7 = single text line)
    pub ocr_page_seg_mode: u8,
    pub stop_mode: StopMode,
    pub record_layout: RecordLayout,
    /// Consecutive frame read errors tolerated before giving up
    pub max_read_failures: u32,
    /// Save every Nth annotated sampled frame (0 = never)
    pub preview_every: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stride: 5,
            text_brightness_floor: 200.0,
            lit_threshold: 200.0,
            gauge_rise_threshold: 50.0,
            angle_window: 5,
            jitter_degrees: 2.0,
            ocr_workers: 3,
            tesseract_path: None,
            tessdata_dir: None,
            ocr_page_seg_mode: 7,
            stop_mode: StopMode::Exact,
            record_layout: RecordLayout::Extended,
            max_read_failures: 10,
            preview_every: 0,
        }
    }
}

impl PipelineConfig {
    /// Parses a config file, failing on unreadable or malformed JSON.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: PipelineConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.validated()
    }

    pub fn validated(self) -> Result<Self> {
        anyhow::ensure!(self.stride > 0, "stride must be at least 1");
        anyhow::ensure!(self.angle_window > 0, "angle_window must be at least 1");
        anyhow::ensure!(self.ocr_workers > 0, "ocr_workers must be at least 1");
        Ok(self)
    }
}

/// Loads configuration.
///
/// An explicit path must exist and parse. Without one, `config.json` next to
/// the executable is tried, falling back to defaults if it is absent or broken.
pub fn load_config(explicit: Option<&Path>) -> Result<PipelineConfig> {
    if let Some(path) = explicit {
        log::info!("Loading config from {}", path.display());
        return PipelineConfig::from_file(path);
    }

    let config_path = crate::paths::get_exe_dir().join("config.json");
    log::debug!("Looking for config at: {}", config_path.display());

    if config_path.exists() {
        match PipelineConfig::from_file(&config_path) {
            Ok(config) => {
                log::info!("Config loaded from {}", config_path.display());
                return Ok(config);
            }
            Err(e) => {
                log::warn!("{e:#}. Using defaults.");
            }
        }
    } else {
        log::info!("config.json not found. Using default config.");
    }

    Ok(PipelineConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_partial_config_takes_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "stride": 3, "stop_mode": "numeric" }"#).unwrap();

        let config = load_config(Some(&path)).unwrap();

        assert_eq!(config.stride, 3);
        assert_eq!(config.stop_mode, StopMode::Numeric);
        assert_eq!(config.angle_window, 5);
        assert_eq!(config.record_layout, RecordLayout::Extended);
    }

    #[test]
    fn test_explicit_missing_config_is_error() {
        let dir = tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("nope.json"))).is_err());
    }

    #[test]
    fn test_zero_stride_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "stride": 0 }"#).unwrap();
        assert!(PipelineConfig::from_file(&path).is_err());
    }

    #[test]
    fn test_default_round_trips_through_json() {
        let json = serde_json::to_string(&PipelineConfig::default()).unwrap();
        let parsed: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.stride, 5);
        assert_eq!(parsed.ocr_page_seg_mode, 7);
    }
}
