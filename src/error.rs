//! Error taxonomy for the measurement pipeline.
//!
//! Only configuration errors and source failures end a run. Per-measurement
//! failures never surface here: a missing line, circle or gauge transition is
//! carried as a [`crate::telemetry::Reading`] sentinel instead.

use thiserror::Error;

use crate::profile::PixelRect;

#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Unknown vehicle profile or otherwise unusable configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Gauge coordinates that are malformed or not horizontal.
    #[error("invalid gauge line: {0}")]
    InvalidGaugeLine(String),
    /// A text ROI does not fit the current frame.
    #[error("region {region} exceeds frame size {frame_width}x{frame_height}")]
    RegionOutOfBounds {
        region: PixelRect,
        frame_width: u32,
        frame_height: u32,
    },
    /// The frame source failed (not the same as exhaustion).
    #[error("video source error: {0}")]
    Source(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TelemetryError>;
