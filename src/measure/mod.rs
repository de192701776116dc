//! Graphical HUD measurements: attitude angle, engine ignition and
//! propellant levels.

pub mod angle;
pub mod circles;
pub mod ignition;
pub mod propellant;

pub use angle::{ANGLE_ROI, AngleEstimator, AngleSmoother};
pub use ignition::{EngineCounts, IgnitionDetector, IgnitionRegion};
pub use propellant::PropellantAnalyzer;
