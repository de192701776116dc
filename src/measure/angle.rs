//! Vehicle attitude from straight edges in the silhouette ROI.
//!
//! Edges are found with Canny, lines with a Hough transform; per-frame line
//! angles are averaged and then smoothed over a short window owned by the
//! estimator.

use image::GrayImage;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::hough::{LineDetectionOptions, detect_lines};
use std::collections::VecDeque;

use crate::profile::PixelRect;
use crate::raster::{Frame, crop_region, to_gray};
use crate::telemetry::Reading;

/// Rectangle over the vehicle silhouette in a 1080p broadcast frame.
pub const ANGLE_ROI: PixelRect = PixelRect::from_corners(1170, 900, 1320, 1080);

const CANNY_LOW: f32 = 50.0;
const CANNY_HIGH: f32 = 150.0;
/// Minimum accumulator votes for a line (1 px / 1 degree bins).
const LINE_VOTES: u32 = 60;
/// Sigma equivalent to a 5x5 Gaussian kernel.
///
/// Applied before `canny`, which smooths again with its own sigma of 1.4, so
/// the edges are found on an image blurred twice. The thresholds below are
/// tuned for that.
const BLUR_SIGMA: f32 = 1.1;
/// Distance the endpoints are projected along the line direction.
const ENDPOINT_PROJECTION: f64 = 1000.0;

/// Fixed-capacity window of instantaneous angles, oldest first.
#[derive(Clone, Debug)]
pub struct AngleSmoother {
    samples: VecDeque<f64>,
    capacity: usize,
    jitter_degrees: f64,
}

impl AngleSmoother {
    pub fn new(capacity: usize, jitter_degrees: f64) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            jitter_degrees,
        }
    }

    /// Pushes an instantaneous angle and returns the smoothed value.
    ///
    /// Until the window is full the instantaneous angle is returned as-is.
    /// A smoothed value within `jitter_degrees` of the newest sample snaps to it.
    pub fn push(&mut self, angle: f64) -> f64 {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(angle);

        let smoothed = if self.samples.len() >= self.capacity {
            self.samples.iter().sum::<f64>() / self.samples.len() as f64
        } else {
            angle
        };

        if (smoothed - angle).abs() < self.jitter_degrees {
            angle
        } else {
            smoothed
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Angle estimator for one tracked vehicle.
///
/// Owns its smoothing window; create a fresh one per run or profile.
#[derive(Clone, Debug)]
pub struct AngleEstimator {
    roi: PixelRect,
    smoother: AngleSmoother,
}

impl AngleEstimator {
    pub fn new(window: usize, jitter_degrees: f64) -> Self {
        Self::with_roi(ANGLE_ROI, window, jitter_degrees)
    }

    pub fn with_roi(roi: PixelRect, window: usize, jitter_degrees: f64) -> Self {
        Self {
            roi,
            smoother: AngleSmoother::new(window, jitter_degrees),
        }
    }

    pub fn roi(&self) -> PixelRect {
        self.roi
    }

    pub fn smoother(&self) -> &AngleSmoother {
        &self.smoother
    }

    /// Empties the smoothing window, e.g. before a new video.
    pub fn reset(&mut self) {
        self.smoother.clear();
    }

    /// Estimates the smoothed attitude angle in degrees.
    ///
    /// Frames without any line leave the window untouched.
    pub fn estimate(&mut self, frame: &Frame) -> Reading<f64> {
        let roi = crop_region(frame, &self.roi);
        let gray = to_gray(&roi);
        if gray.width() == 0 || gray.height() == 0 {
            return Reading::Undetected;
        }
        let blurred = gaussian_blur_f32(&gray, BLUR_SIGMA);

        match instantaneous_angle(&blurred) {
            Some(angle) => Reading::Value(self.smoother.push(angle)),
            None => Reading::Undetected,
        }
    }
}

/// Mean angle of all Hough lines found on the Canny edges of `gray`.
pub fn instantaneous_angle(gray: &GrayImage) -> Option<f64> {
    if gray.width() < 3 || gray.height() < 3 {
        return None;
    }
    let edges = canny(gray, CANNY_LOW, CANNY_HIGH);
    let lines = detect_lines(
        &edges,
        LineDetectionOptions {
            vote_threshold: LINE_VOTES,
            suppression_radius: 1,
        },
    );
    if lines.is_empty() {
        return None;
    }

    log::trace!("angle: {} lines", lines.len());
    let angles: Vec<f64> = lines
        .iter()
        .map(|l| line_angle_degrees(l.r as f64, l.angle_in_degrees as f64))
        .collect();
    Some(mean_line_angle(&angles))
}

/// Mean of line directions, which are only defined modulo 180 degrees.
///
/// Each angle is first moved into the half-turn window around the first one,
/// so -90 and 89 average to -90.5 instead of cancelling out.
fn mean_line_angle(angles: &[f64]) -> f64 {
    let Some(&reference) = angles.first() else {
        return 0.0;
    };
    let sum: f64 = angles
        .iter()
        .map(|&a| a - 180.0 * ((a - reference) / 180.0).round())
        .sum();
    sum / angles.len() as f64
}

/// Direction of a polar line `(rho, theta)` in degrees.
///
/// Uses two endpoints projected from the foot of the perpendicular rather
/// than theta alone, which fixes the sign of the result.
pub fn line_angle_degrees(rho: f64, theta_degrees: f64) -> f64 {
    let (sin, cos) = theta_degrees.to_radians().sin_cos();
    let (x0, y0) = (cos * rho, sin * rho);

    let (x1, y1) = (x0 - ENDPOINT_PROJECTION * sin, y0 + ENDPOINT_PROJECTION * cos);
    let (x2, y2) = (x0 + ENDPOINT_PROJECTION * sin, y0 - ENDPOINT_PROJECTION * cos);

    (y2 - y1).atan2(x2 - x1).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma, Rgb, RgbImage};

    #[test]
    fn test_line_angle_from_polar() {
        assert!(line_angle_degrees(20.0, 90.0).abs() < 1e-9);
        assert!((line_angle_degrees(20.0, 0.0) + 90.0).abs() < 1e-9);
        assert!((line_angle_degrees(50.0, 45.0) + 45.0).abs() < 1e-9);
        assert!((line_angle_degrees(50.0, 135.0) - 45.0).abs() < 1e-9);
        // Independent of rho
        assert!((line_angle_degrees(-12.0, 135.0) - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_horizontal_edge() {
        let img: GrayImage =
            ImageBuffer::from_fn(120, 40, |_, y| Luma([if y < 20 { 0 } else { 255 }]));

        let angle = instantaneous_angle(&img).expect("edge should produce lines");
        assert!(angle.abs() <= 1.0, "got {angle}");
    }

    #[test]
    fn test_diagonal_edge() {
        // Boundary along x + y = 100, direction (1, -1) in image coordinates
        let img: GrayImage =
            ImageBuffer::from_fn(100, 100, |x, y| Luma([if x + y > 100 { 255 } else { 0 }]));

        let angle = instantaneous_angle(&img).expect("edge should produce lines");
        assert!((angle + 45.0).abs() <= 1.0, "got {angle}");
    }

    #[test]
    fn test_vertical_edge() {
        let img: GrayImage =
            ImageBuffer::from_fn(150, 180, |x, _| Luma([if x < 75 { 0 } else { 255 }]));

        let angle = instantaneous_angle(&img).expect("edge should produce lines");
        assert!((angle.abs() - 90.0).abs() <= 1.0, "got {angle}");
    }

    #[test]
    fn test_mean_line_angle_wraps() {
        // Hough reports a vertical edge at theta 0 and 179
        assert!((mean_line_angle(&[-90.0, 89.0]) + 90.5).abs() < 1e-9);
        assert!((mean_line_angle(&[89.0, -90.0]) - 89.5).abs() < 1e-9);
        assert!((mean_line_angle(&[-44.0, -46.0]) + 45.0).abs() < 1e-9);
        assert!((mean_line_angle(&[1.0, -1.0, 0.0])).abs() < 1e-9);
    }

    #[test]
    fn test_flat_image_has_no_lines() {
        let img = GrayImage::from_pixel(60, 60, Luma([128]));
        assert_eq!(instantaneous_angle(&img), None);
        assert_eq!(instantaneous_angle(&GrayImage::new(2, 2)), None);
    }

    #[test]
    fn test_smoother_cold_start_then_mean() {
        let mut smoother = AngleSmoother::new(5, 2.0);
        let outputs: Vec<f64> = [10.0, 12.0, 11.0, 50.0, 10.0]
            .into_iter()
            .map(|a| smoother.push(a))
            .collect();

        // Window not yet full: instantaneous values pass through
        assert_eq!(&outputs[..4], &[10.0, 12.0, 11.0, 50.0]);
        // Full window: mean of all five, 8.6 away from the newest so no snap
        assert!((outputs[4] - 18.6).abs() < 1e-9);
        assert_eq!(smoother.len(), 5);
    }

    #[test]
    fn test_smoother_snaps_small_drift() {
        let mut smoother = AngleSmoother::new(5, 2.0);
        for _ in 0..4 {
            smoother.push(10.0);
        }
        // Mean 10.2 is within 2 degrees of the newest sample
        assert_eq!(smoother.push(11.0), 11.0);
        // Mean 10.4 is still close to 11.0
        assert_eq!(smoother.push(11.0), 11.0);
        // A real move is smoothed, not snapped
        let moved = smoother.push(30.0);
        assert!((moved - 14.4).abs() < 1e-9, "got {moved}");
    }

    #[test]
    fn test_smoother_evicts_oldest() {
        let mut smoother = AngleSmoother::new(3, 0.0);
        for a in [100.0, 0.0, 0.0, 0.0] {
            smoother.push(a);
        }
        assert_eq!(smoother.len(), 3);
        assert_eq!(smoother.push(3.0), 1.0);
    }

    #[test]
    fn test_estimator_keeps_window_across_frames() {
        let roi = PixelRect::new(10, 10, 120, 40);
        let mut estimator = AngleEstimator::with_roi(roi, 5, 2.0);

        let edge_frame: RgbImage = ImageBuffer::from_fn(200, 80, |_, y| {
            if y < 30 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) }
        });
        let blank = RgbImage::new(200, 80);

        assert!(estimator.estimate(&edge_frame).is_value());
        assert!(estimator.estimate(&edge_frame).is_value());
        assert_eq!(estimator.smoother().len(), 2);

        // No lines: undetected, window unchanged
        assert_eq!(estimator.estimate(&blank), Reading::Undetected);
        assert_eq!(estimator.smoother().len(), 2);
    }

    #[test]
    fn test_estimator_on_small_frame() {
        let mut estimator = AngleEstimator::new(5, 2.0);
        // Default ROI lies entirely outside a tiny frame
        assert_eq!(estimator.estimate(&RgbImage::new(64, 64)), Reading::Undetected);
    }
}
