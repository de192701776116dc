//! Frame orchestration.
//!
//! Drives a [`crate::video::FrameSource`] through the measurements and fans
//! the resulting records out to the sinks.

pub mod orchestrator;
pub mod preview;
pub mod state;

pub use orchestrator::Orchestrator;
pub use preview::{NoPreview, Overlay, Preview, SnapshotPreview};
pub use state::{AbortHandle, PipelineState, RunSummary, StopReason};
