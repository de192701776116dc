//! Diagnostic overlay for watching a run.
//!
//! Sampled frames are annotated with every region the measurements read;
//! skipped frames are passed through untouched.

use image::Rgb;
use std::fs;
use std::path::PathBuf;

use crate::measure::IgnitionRegion;
use crate::profile::{GaugeLine, PixelRect, VehicleProfile};
use crate::raster::Frame;

pub const COLOR_SPEED: Rgb<u8> = Rgb([0, 255, 0]); // Green
pub const COLOR_ALTITUDE: Rgb<u8> = Rgb([0, 0, 255]); // Blue
pub const COLOR_CLOCK: Rgb<u8> = Rgb([255, 0, 0]); // Red
pub const COLOR_ANGLE: Rgb<u8> = Rgb([255, 255, 0]); // Yellow
pub const COLOR_ENGINES: Rgb<u8> = Rgb([255, 128, 0]); // Orange
pub const COLOR_GAUGE: Rgb<u8> = Rgb([255, 0, 255]); // Magenta

/// Every region drawn onto a sampled frame.
#[derive(Clone, Debug)]
pub struct Overlay {
    pub speed: PixelRect,
    pub altitude: PixelRect,
    pub mission_clock: PixelRect,
    pub angle: PixelRect,
    pub engines: Vec<PixelRect>,
    pub gauges: Vec<GaugeLine>,
}

impl Overlay {
    pub fn new(profile: &VehicleProfile, angle: PixelRect, engines: &[IgnitionRegion]) -> Self {
        Self {
            speed: profile.speed,
            altitude: profile.altitude,
            mission_clock: profile.mission_clock,
            angle,
            engines: engines.iter().map(|r| r.roi).collect(),
            gauges: profile
                .gauges
                .map(|g| vec![g.lox, g.ch4])
                .unwrap_or_default(),
        }
    }
}

/// Receives every frame the orchestrator reads.
pub trait Preview {
    /// `overlay` is `Some` for sampled frames only.
    fn show(&mut self, frame_index: u64, frame: &Frame, overlay: Option<&Overlay>);
}

/// Discards frames.
#[derive(Debug, Default)]
pub struct NoPreview;

impl Preview for NoPreview {
    fn show(&mut self, _frame_index: u64, _frame: &Frame, _overlay: Option<&Overlay>) {}
}

/// Saves every Nth sampled frame, annotated, as a PNG.
#[derive(Debug)]
pub struct SnapshotPreview {
    dir: PathBuf,
    every: u64,
    sampled: u64,
    saved: usize,
}

impl SnapshotPreview {
    pub fn new(dir: PathBuf, every: u64) -> Self {
        Self {
            dir,
            every: every.max(1),
            sampled: 0,
            saved: 0,
        }
    }

    pub fn saved(&self) -> usize {
        self.saved
    }
}

impl Preview for SnapshotPreview {
    fn show(&mut self, frame_index: u64, frame: &Frame, overlay: Option<&Overlay>) {
        let Some(overlay) = overlay else {
            return;
        };
        self.sampled += 1;
        if (self.sampled - 1) % self.every != 0 {
            return;
        }

        if let Err(e) = fs::create_dir_all(&self.dir) {
            log::warn!("Failed to create preview folder {}: {}", self.dir.display(), e);
            return;
        }
        let path = self.dir.join(format!("frame_{frame_index:06}.png"));
        match annotate(frame, overlay).save(&path) {
            Ok(()) => {
                self.saved += 1;
                log::debug!("Preview saved: {}", path.display());
            }
            Err(e) => log::warn!("Failed to save preview {}: {}", path.display(), e),
        }
    }
}

/// Draws all overlay regions onto a copy of `frame`.
pub fn annotate(frame: &Frame, overlay: &Overlay) -> Frame {
    let mut img = frame.clone();

    draw_rect(&mut img, &overlay.speed, COLOR_SPEED, 2);
    draw_rect(&mut img, &overlay.altitude, COLOR_ALTITUDE, 2);
    draw_rect(&mut img, &overlay.mission_clock, COLOR_CLOCK, 2);
    draw_rect(&mut img, &overlay.angle, COLOR_ANGLE, 1);
    for roi in &overlay.engines {
        draw_rect(&mut img, roi, COLOR_ENGINES, 1);
    }
    for line in &overlay.gauges {
        draw_gauge(&mut img, line, COLOR_GAUGE);
    }

    img
}

/// Draws a rectangle border, clipped to the image.
pub fn draw_rect(img: &mut Frame, rect: &PixelRect, color: Rgb<u8>, thickness: u32) {
    if rect.width == 0 || rect.height == 0 {
        return;
    }
    let (img_w, img_h) = img.dimensions();
    let mut put = |px: u32, py: u32| {
        if px < img_w && py < img_h {
            img.put_pixel(px, py, color);
        }
    };

    for t in 0..thickness.min(rect.height) {
        for x in rect.x..rect.right() {
            put(x, rect.y + t);
            put(x, rect.bottom() - 1 - t);
        }
    }
    for t in 0..thickness.min(rect.width) {
        for y in rect.y..rect.bottom() {
            put(rect.x + t, y);
            put(rect.right() - 1 - t, y);
        }
    }
}

/// Marks a gauge row with a one-pixel line.
fn draw_gauge(img: &mut Frame, line: &GaugeLine, color: Rgb<u8>) {
    let (img_w, img_h) = img.dimensions();
    if line.y >= img_h {
        return;
    }
    for x in line.x1..line.x2.min(img_w) {
        img.put_pixel(x, line.y, color);
    }
}
