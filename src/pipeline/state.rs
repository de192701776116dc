//! Run state, stop reasons and cancellation.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::clock::parse_clock_seconds;
use crate::config::StopMode;

/// Where the orchestrator is in its frame loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PipelineState {
    /// Passing over a frame between sampling points
    Skipping,
    /// Measuring a frame on the stride
    #[default]
    Sampling,
    /// Target reached, source exhausted or aborted
    Stopped,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Skipping => write!(f, "Skipping"),
            PipelineState::Sampling => write!(f, "Sampling"),
            PipelineState::Stopped => write!(f, "Stopped"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// The recognized mission clock matched the stop time
    TargetReached,
    SourceExhausted,
    Aborted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::TargetReached => write!(f, "stop time reached"),
            StopReason::SourceExhausted => write!(f, "end of video"),
            StopReason::Aborted => write!(f, "aborted"),
        }
    }
}

/// Outcome of one orchestrator run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    /// Frame slots consumed, including failed reads
    pub frames_read: u64,
    pub records: u64,
    /// Sampled frames dropped because a text region did not fit
    pub frames_out_of_bounds: u64,
    pub read_failures: u64,
    pub stop_reason: StopReason,
    /// Mission clock of the last emitted record
    pub last_clock: Option<String>,
}

/// Cancels a run at the next frame boundary. Clones share one flag.
#[derive(Clone, Debug, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    /// Aborts on Ctrl-C so the run stops cleanly and its sinks are finished.
    ///
    /// Only one process-wide handler can be installed.
    pub fn abort_on_interrupt(&self) -> Result<(), ctrlc::Error> {
        let handle = self.clone();
        ctrlc::set_handler(move || {
            log::warn!("Interrupted, stopping after the current frame");
            handle.abort();
        })
    }
}

/// Whether a recognized (digit/colon filtered) clock matches the stop time.
pub fn stop_reached(mode: StopMode, clock: &str, target: &str) -> bool {
    match mode {
        StopMode::Exact => clock == target,
        StopMode::Numeric => match (parse_clock_seconds(clock), parse_clock_seconds(target)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_stop_ignores_formatting_drift() {
        assert!(stop_reached(StopMode::Exact, "01:05:50", "01:05:50"));
        assert!(!stop_reached(StopMode::Exact, "1:05:50", "01:05:50"));
        assert!(!stop_reached(StopMode::Exact, "", "01:05:50"));
    }

    #[test]
    fn test_numeric_stop() {
        assert!(stop_reached(StopMode::Numeric, "1:05:50", "01:05:50"));
        assert!(!stop_reached(StopMode::Numeric, "01:05:49", "01:05:50"));
        assert!(!stop_reached(StopMode::Numeric, "0105:50", "01:05:50"));
    }

    #[test]
    fn test_abort_handle_is_shared() {
        let handle = AbortHandle::new();
        let clone = handle.clone();
        assert!(!handle.is_aborted());
        clone.abort();
        assert!(handle.is_aborted());
        handle.reset();
        assert!(!clone.is_aborted());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(PipelineState::Skipping.to_string(), "Skipping");
        assert_eq!(StopReason::SourceExhausted.to_string(), "end of video");
    }
}
