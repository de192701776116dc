//! The frame loop.
//!
//! Frames are read strictly in order on the calling thread. Every `stride`-th
//! frame is measured: the three text readouts are recognized in parallel on
//! a small worker pool, then the graphical measurements run on the same frame
//! and one record goes to every sink.

use crate::clock::clock_to_millis;
use crate::config::PipelineConfig;
use crate::error::{Result, TelemetryError};
use crate::measure::{AngleEstimator, IgnitionDetector, PropellantAnalyzer};
use crate::ocr::{TextRecognizer, extract_altitude, extract_clock, extract_speed, read_region};
use crate::output::RecordSink;
use crate::profile::VehicleProfile;
use crate::raster::{Frame, crop_checked};
use crate::telemetry::{Reading, TelemetryRecord};
use crate::video::FrameSource;

use super::preview::{NoPreview, Overlay, Preview};
use super::state::{AbortHandle, PipelineState, RunSummary, StopReason, stop_reached};

pub struct Orchestrator<'a> {
    profile: &'static VehicleProfile,
    config: PipelineConfig,
    recognizer: &'a dyn TextRecognizer,
    pool: rayon::ThreadPool,
    angle: AngleEstimator,
    ignition: IgnitionDetector,
    propellant: PropellantAnalyzer,
    overlay: Overlay,
    preview: Box<dyn Preview + 'a>,
    abort: AbortHandle,
    state: PipelineState,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        profile: &'static VehicleProfile,
        config: PipelineConfig,
        recognizer: &'a dyn TextRecognizer,
    ) -> Result<Self> {
        let config = config
            .validated()
            .map_err(|e| TelemetryError::Configuration(format!("{e:#}")))?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.ocr_workers)
            .thread_name(|i| format!("ocr-{i}"))
            .build()
            .map_err(|e| TelemetryError::Configuration(format!("OCR worker pool: {e}")))?;

        let angle = AngleEstimator::new(config.angle_window, config.jitter_degrees);
        let ignition = IgnitionDetector::new(config.lit_threshold);
        let overlay = Overlay::new(profile, angle.roi(), &ignition.regions());

        Ok(Self {
            profile,
            recognizer,
            pool,
            angle,
            ignition,
            propellant: PropellantAnalyzer::new(config.gauge_rise_threshold),
            overlay,
            preview: Box::new(NoPreview),
            abort: AbortHandle::new(),
            state: PipelineState::default(),
            config,
        })
    }

    pub fn with_preview(mut self, preview: Box<dyn Preview + 'a>) -> Self {
        self.preview = preview;
        self
    }

    /// Handle for cancelling [`Orchestrator::run`] from another thread.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn profile(&self) -> &'static VehicleProfile {
        self.profile
    }

    /// Runs from `start_time` until the recognized mission clock matches
    /// `stop_time`, the source runs dry or the run is aborted.
    ///
    /// Sinks are finished even when the run fails.
    pub fn run(
        &mut self,
        source: &mut dyn FrameSource,
        sinks: &mut [&mut dyn RecordSink],
        start_time: &str,
        stop_time: &str,
    ) -> Result<RunSummary> {
        self.state = PipelineState::Sampling;
        self.angle.reset();

        let outcome = self.drive(source, sinks, start_time, stop_time);
        self.state = PipelineState::Stopped;

        let mut finished = Ok(());
        for sink in sinks.iter_mut() {
            if let Err(e) = sink.finish() {
                log::error!("Failed to finish output: {e}");
                finished = Err(e);
            }
        }

        let summary = outcome?;
        finished?;
        log::info!(
            "Stopped ({}): {} records from {} frames",
            summary.stop_reason,
            summary.records,
            summary.frames_read
        );
        Ok(summary)
    }

    fn drive(
        &mut self,
        source: &mut dyn FrameSource,
        sinks: &mut [&mut dyn RecordSink],
        start_time: &str,
        stop_time: &str,
    ) -> Result<RunSummary> {
        let start_ms = clock_to_millis(start_time).unwrap_or_else(|| {
            log::warn!("Unrecognized start time {start_time:?}, starting from the beginning");
            0
        });
        source.seek(start_ms)?;
        log::info!(
            "Profile {}: sampling every {} frames from {} ms until clock {:?} ({:?} match)",
            self.profile.id,
            self.config.stride,
            start_ms,
            stop_time,
            self.config.stop_mode
        );

        let mut summary = RunSummary {
            frames_read: 0,
            records: 0,
            frames_out_of_bounds: 0,
            read_failures: 0,
            stop_reason: StopReason::SourceExhausted,
            last_clock: None,
        };
        let mut consecutive_failures = 0u32;
        let mut frame_index = 0u64;

        loop {
            if self.abort.is_aborted() {
                log::warn!("Abort requested");
                summary.stop_reason = StopReason::Aborted;
                break;
            }

            let frame = match source.next_frame() {
                Ok(Some(frame)) => {
                    consecutive_failures = 0;
                    frame
                }
                Ok(None) => {
                    summary.stop_reason = StopReason::SourceExhausted;
                    break;
                }
                Err(e) => {
                    // A failed read still uses up its frame slot
                    frame_index += 1;
                    summary.frames_read += 1;
                    summary.read_failures += 1;
                    consecutive_failures += 1;
                    log::warn!(
                        "Frame read failed ({consecutive_failures}/{}): {e}",
                        self.config.max_read_failures
                    );
                    if consecutive_failures >= self.config.max_read_failures {
                        return Err(e);
                    }
                    continue;
                }
            };

            let index = frame_index;
            frame_index += 1;
            summary.frames_read += 1;

            if index % self.config.stride != 0 {
                self.state = PipelineState::Skipping;
                self.preview.show(index, &frame, None);
                continue;
            }
            self.state = PipelineState::Sampling;

            let record = match self.sample(index, &frame) {
                Ok(record) => record,
                Err(e @ TelemetryError::RegionOutOfBounds { .. }) => {
                    log::warn!("Frame {index} skipped: {e}");
                    summary.frames_out_of_bounds += 1;
                    self.preview.show(index, &frame, None);
                    continue;
                }
                Err(e) => return Err(e),
            };
            self.preview.show(index, &frame, Some(&self.overlay));

            for sink in sinks.iter_mut() {
                sink.write(&record)?;
            }
            summary.records += 1;
            log::debug!(
                "#{index} clock={} speed={} altitude={} angle={} engines={}/{} lox={} ch4={}",
                record.mission_clock,
                record.speed,
                record.altitude,
                record.angle,
                record.engines_upper,
                record.engines_booster,
                record.lox_percent,
                record.ch4_percent
            );

            let reached = stop_reached(self.config.stop_mode, &record.mission_clock, stop_time);
            summary.last_clock = Some(record.mission_clock);
            if reached {
                summary.stop_reason = StopReason::TargetReached;
                break;
            }
        }

        Ok(summary)
    }

    /// Measures one sampled frame.
    ///
    /// Fails only if a text region does not fit the frame.
    fn sample(&mut self, frame_index: u64, frame: &Frame) -> Result<TelemetryRecord> {
        let speed_img = crop_checked(frame, &self.profile.speed)?;
        let altitude_img = crop_checked(frame, &self.profile.altitude)?;
        let clock_img = crop_checked(frame, &self.profile.mission_clock)?;

        let recognizer = self.recognizer;
        let floor = self.config.text_brightness_floor;
        let (speed_text, (altitude_text, clock_text)) = self.pool.install(|| {
            rayon::join(
                || read_region(recognizer, &speed_img, floor),
                || {
                    rayon::join(
                        || read_region(recognizer, &altitude_img, floor),
                        || read_region(recognizer, &clock_img, floor),
                    )
                },
            )
        });

        let angle = self.angle.estimate(frame);
        let engines = self.ignition.detect(frame);
        let (lox_percent, ch4_percent) = match &self.profile.gauges {
            Some(gauges) => (
                self.propellant.measure(frame, &gauges.lox),
                self.propellant.measure(frame, &gauges.ch4),
            ),
            None => (Reading::Unavailable, Reading::Unavailable),
        };

        Ok(TelemetryRecord {
            frame_index,
            mission_clock: extract_clock(&clock_text),
            speed: extract_speed(&speed_text),
            altitude: extract_altitude(&altitude_text),
            angle,
            engines_upper: engines.upper,
            engines_booster: engines.booster,
            lox_percent,
            ch4_percent,
        })
    }
}
