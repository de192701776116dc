//! Propellant tank fill level from a horizontal gauge bar.
//!
//! The filled part of the bar is drawn brighter than the empty part. The
//! boundary is found by scanning the row profile from the far end back
//! toward the near end and refined to sub-pixel precision.

use crate::profile::GaugeLine;
use crate::raster::{Frame, luma};
use crate::telemetry::Reading;

/// Default rise on the normalized profile marking the fill boundary.
pub const DEFAULT_RISE_THRESHOLD: f32 = 50.0;

#[derive(Clone, Copy, Debug)]
pub struct PropellantAnalyzer {
    rise_threshold: f32,
}

impl Default for PropellantAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_RISE_THRESHOLD)
    }
}

impl PropellantAnalyzer {
    pub fn new(rise_threshold: f32) -> Self {
        Self { rise_threshold }
    }

    /// Fill percentage along raw gauge coordinates `(x1, y1, x2, y2)`.
    ///
    /// Malformed or non-horizontal coordinates are logged and reported as
    /// unavailable rather than returned as an error.
    pub fn analyze_propellant_bar(&self, frame: &Frame, coords: &[i64]) -> Reading<f64> {
        match GaugeLine::from_coords(coords) {
            Ok(line) => self.measure(frame, &line),
            Err(e) => {
                log::error!("{e}");
                Reading::Unavailable
            }
        }
    }

    /// Fill percentage along a validated gauge line.
    pub fn measure(&self, frame: &Frame, line: &GaugeLine) -> Reading<f64> {
        let profile = gauge_profile(frame, line);
        if profile.is_empty() {
            log::debug!("gauge line {line:?} yields an empty strip");
            return Reading::Unavailable;
        }
        fill_percentage(&normalize_min_max(&profile), self.rise_threshold)
            .map_or(Reading::Unavailable, Reading::Value)
    }
}

/// Intensity samples of row `line.y` from `x1` up to (excluding) `x2`,
/// clipped to the frame.
fn gauge_profile(frame: &Frame, line: &GaugeLine) -> Vec<f32> {
    let (w, h) = frame.dimensions();
    if line.y >= h {
        return Vec::new();
    }
    let end = line.x2.min(w);
    (line.x1..end)
        .map(|x| luma(frame.get_pixel(x, line.y)))
        .collect()
}

/// Stretches samples to [0, 255]. A flat profile maps to all zeros.
pub fn normalize_min_max(values: &[f32]) -> Vec<f32> {
    let min = values.iter().copied().fold(f32::INFINITY, f32::min);
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let range = max - min;
    if !range.is_finite() || range <= 0.0 {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| (v - min) * 255.0 / range).collect()
}

/// Locates the fill boundary on a normalized profile and returns the filled
/// share in percent, or `None` when no boundary exists (empty, full or
/// occluded gauge).
pub fn fill_percentage(profile: &[f32], rise_threshold: f32) -> Option<f64> {
    let (&last, rest) = profile.split_last()?;
    let mut previous = last;

    for (i, &current) in rest.iter().enumerate().rev() {
        let target = previous + rise_threshold;
        if current > target {
            // Sub-pixel position where the profile crosses `target`
            let offset = if previous != current {
                (target - current) / (previous - current)
            } else {
                0.0
            };
            let position = i as f64 + offset as f64;
            return Some(position / profile.len() as f64 * 100.0);
        }
        previous = current;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb, RgbImage};

    /// A 1-row gauge: bright for the first `filled` pixels, dark after.
    fn gauge_frame(width: u32, filled: u32) -> RgbImage {
        ImageBuffer::from_fn(width, 3, |x, _| {
            if x < filled { Rgb([230, 230, 230]) } else { Rgb([40, 40, 40]) }
        })
    }

    #[test]
    fn test_bright_to_dark_boundary() {
        let profile = normalize_min_max(&[200.0, 200.0, 200.0, 200.0, 50.0, 50.0, 50.0]);
        let pct = fill_percentage(&profile, 50.0).unwrap();
        // Boundary at 3 + 205/255 of 7 samples
        assert!((pct - 54.34).abs() < 0.01, "got {pct}");
        assert!((50.0..60.0).contains(&pct));
    }

    #[test]
    fn test_rising_toward_far_end_has_no_boundary() {
        // Brighter at the far end: scanning back only ever falls
        let profile = normalize_min_max(&[50.0, 50.0, 50.0, 50.0, 200.0, 200.0, 200.0]);
        assert_eq!(fill_percentage(&profile, 50.0), None);
    }

    #[test]
    fn test_flat_profile_has_no_boundary() {
        let profile = normalize_min_max(&[90.0; 12]);
        assert!(profile.iter().all(|&v| v == 0.0));
        assert_eq!(fill_percentage(&profile, 50.0), None);
        assert_eq!(fill_percentage(&[], 50.0), None);
    }

    #[test]
    fn test_interpolation_between_samples() {
        // previous = 0, current = 100, target = 50: halfway into the pixel
        let pct = fill_percentage(&[100.0, 0.0], 50.0).unwrap();
        assert!((pct - 25.0).abs() < 1e-9, "got {pct}");
    }

    #[test]
    fn test_measure_on_frame() {
        let frame = gauge_frame(100, 40);
        let analyzer = PropellantAnalyzer::default();
        let line = GaugeLine::new(0, 1, 100, 1).unwrap();

        let pct = *analyzer.measure(&frame, &line).value().unwrap();
        assert!((39.0..41.0).contains(&pct), "got {pct}");
    }

    #[test]
    fn test_full_and_empty_gauges_unavailable() {
        let analyzer = PropellantAnalyzer::default();
        let line = GaugeLine::new(0, 1, 100, 1).unwrap();
        assert_eq!(analyzer.measure(&gauge_frame(100, 100), &line), Reading::Unavailable);
        assert_eq!(analyzer.measure(&gauge_frame(100, 0), &line), Reading::Unavailable);
    }

    #[test]
    fn test_non_horizontal_line_unavailable() {
        let analyzer = PropellantAnalyzer::default();
        let frame = gauge_frame(20, 10);
        assert_eq!(
            analyzer.analyze_propellant_bar(&frame, &[0, 5, 10, 6]),
            Reading::Unavailable
        );
        assert_eq!(analyzer.analyze_propellant_bar(&frame, &[0, 1, 10]), Reading::Unavailable);
        assert!(analyzer.analyze_propellant_bar(&frame, &[0, 1, 20, 1]).is_value());
    }

    #[test]
    fn test_empty_strip_unavailable() {
        let analyzer = PropellantAnalyzer::default();
        let frame = gauge_frame(50, 20);
        // Zero-length segment
        assert_eq!(analyzer.analyze_propellant_bar(&frame, &[10, 1, 10, 1]), Reading::Unavailable);
        // Row below the frame
        assert_eq!(analyzer.analyze_propellant_bar(&frame, &[0, 7, 40, 7]), Reading::Unavailable);
        // Starts right of the frame
        assert_eq!(analyzer.analyze_propellant_bar(&frame, &[60, 1, 90, 1]), Reading::Unavailable);
    }
}
