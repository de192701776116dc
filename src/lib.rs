//! Launch telemetry extraction.
//!
//! Reads a rocket launch broadcast frame by frame and recovers the HUD
//! readouts: mission clock, speed and altitude by OCR, plus attitude angle,
//! lit engine counts and propellant levels from the graphical overlay.

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod measure;
pub mod ocr;
pub mod output;
pub mod paths;
pub mod pipeline;
pub mod profile;
pub mod raster;
pub mod telemetry;
pub mod video;

pub use error::{Result, TelemetryError};
pub use profile::{VehicleId, VehicleProfile, lookup};
pub use telemetry::{Reading, RecordLayout, TelemetryRecord};
