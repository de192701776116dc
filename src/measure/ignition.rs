//! Lit-engine counts from the engine diagrams of the HUD.
//!
//! Each engine nozzle renders as a small circle; a lit engine is drawn bright.
//! Counts are per frame with no hysteresis.

use image::RgbImage;
use imageproc::filter::median_filter;

use super::circles::{Circle, CircleParams, detect_circles};
use crate::profile::PixelRect;
use crate::raster::{Frame, channel_mean, crop_region, to_gray};

/// One engine diagram: where it is and how its nozzles render.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IgnitionRegion {
    pub roi: PixelRect,
    pub circles: CircleParams,
}

impl IgnitionRegion {
    /// Upper stage diagram, bottom right of a 1080p frame.
    pub const fn upper_stage() -> Self {
        Self {
            roi: PixelRect::from_corners(1700, 900, 1920, 1080),
            circles: CircleParams {
                dp: 1.2,
                min_dist: 5.0,
                edge_threshold: 50.0,
                vote_threshold: 30,
                min_radius: 10,
                max_radius: 30,
            },
        }
    }

    /// Booster diagram, bottom left; nozzles are much smaller here.
    pub const fn booster() -> Self {
        Self {
            roi: PixelRect::from_corners(20, 900, 180, 1080),
            circles: CircleParams {
                dp: 1.0,
                min_dist: 3.0,
                edge_threshold: 100.0,
                vote_threshold: 20,
                min_radius: 3,
                max_radius: 10,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineCounts {
    pub upper: u32,
    pub booster: u32,
}

#[derive(Clone, Debug)]
pub struct IgnitionDetector {
    upper: IgnitionRegion,
    booster: IgnitionRegion,
    lit_threshold: f32,
}

impl IgnitionDetector {
    pub fn new(lit_threshold: f32) -> Self {
        Self::with_regions(IgnitionRegion::upper_stage(), IgnitionRegion::booster(), lit_threshold)
    }

    pub fn with_regions(upper: IgnitionRegion, booster: IgnitionRegion, lit_threshold: f32) -> Self {
        Self {
            upper,
            booster,
            lit_threshold,
        }
    }

    pub fn regions(&self) -> [IgnitionRegion; 2] {
        [self.upper, self.booster]
    }

    /// Counts lit engines in both diagrams of `frame`.
    pub fn detect(&self, frame: &Frame) -> EngineCounts {
        let counts = EngineCounts {
            upper: self.count_region(frame, &self.upper),
            booster: self.count_region(frame, &self.booster),
        };
        log::debug!("engines: upper={} booster={}", counts.upper, counts.booster);
        counts
    }

    fn count_region(&self, frame: &Frame, region: &IgnitionRegion) -> u32 {
        let roi = crop_region(frame, &region.roi);
        count_lit_engines(&roi, &region.circles, self.lit_threshold)
    }
}

/// Counts bright circles in one cropped engine diagram.
pub fn count_lit_engines(roi: &RgbImage, params: &CircleParams, lit_threshold: f32) -> u32 {
    find_engines(roi, params)
        .iter()
        .filter(|c| is_lit(roi, c, lit_threshold))
        .count() as u32
}

/// Circle candidates in a cropped engine diagram (median-blurred 5x5 first).
pub fn find_engines(roi: &RgbImage, params: &CircleParams) -> Vec<Circle> {
    if roi.width() == 0 || roi.height() == 0 {
        return Vec::new();
    }
    let blurred = median_filter(&to_gray(roi), 2, 2);
    detect_circles(&blurred, params)
}

/// Samples the raw colour at the circle centre; centres off the ROI never count.
fn is_lit(roi: &RgbImage, circle: &Circle, lit_threshold: f32) -> bool {
    let (x, y) = (circle.x.round(), circle.y.round());
    if x < 0.0 || y < 0.0 || x >= roi.width() as f32 || y >= roi.height() as f32 {
        return false;
    }
    channel_mean(roi.get_pixel(x as u32, y as u32)) > lit_threshold
}
