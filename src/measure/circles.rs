//! Gradient Hough circle detector.
//!
//! Each Canny edge pixel votes along its gradient direction (both ways) for
//! every radius in range. The accumulator is box-summed over 3x3 cells, its
//! peaks become centre candidates, and the radius is then chosen from the
//! distances of all edge pixels to that centre.

use image::GrayImage;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};

/// Smoothing `imageproc::edges::canny` applies before finding edges.
const CANNY_SIGMA: f32 = 1.4;

/// Tuning for one detection region.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CircleParams {
    /// Inverse accumulator resolution (1.0 = one cell per pixel)
    pub dp: f32,
    /// Minimum distance between accepted centres, in pixels
    pub min_dist: f32,
    /// Upper Canny threshold; the lower one is half of it
    pub edge_threshold: f32,
    /// Minimum centre votes (summed over 3x3 cells), also the minimum edge
    /// support for the radius
    pub vote_threshold: u32,
    pub min_radius: u32,
    pub max_radius: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

/// Detects circles in a grayscale image, strongest first.
pub fn detect_circles(gray: &GrayImage, params: &CircleParams) -> Vec<Circle> {
    let (w, h) = gray.dimensions();
    if w < 3 || h < 3 || params.max_radius < params.min_radius || params.dp <= 0.0 {
        return Vec::new();
    }

    let edges = canny(gray, params.edge_threshold / 2.0, params.edge_threshold);
    // Directions come from the same smoothing `canny` applies internally
    let smoothed = gaussian_blur_f32(gray, CANNY_SIGMA);
    let gx = horizontal_sobel(&smoothed);
    let gy = vertical_sobel(&smoothed);

    let edge_points: Vec<(u32, u32)> = edges
        .enumerate_pixels()
        .filter(|(_, _, p)| p[0] > 0)
        .map(|(x, y, _)| (x, y))
        .collect();
    if edge_points.is_empty() {
        return Vec::new();
    }

    let acc_w = (w as f32 / params.dp).round() as usize + 1;
    let acc_h = (h as f32 / params.dp).round() as usize + 1;
    let mut accum = vec![0u32; acc_w * acc_h];

    for &(x, y) in &edge_points {
        let gxv = gx.get_pixel(x, y)[0] as f32;
        let gyv = gy.get_pixel(x, y)[0] as f32;
        let mag = (gxv * gxv + gyv * gyv).sqrt();
        if mag < 1e-6 {
            continue;
        }
        let (dx, dy) = (gxv / mag, gyv / mag);

        for sign in [1.0f32, -1.0] {
            // A ray may cross a cell at several radii; count it once
            let mut last_cell = usize::MAX;
            for r in params.min_radius..=params.max_radius {
                let fx = ((x as f32 + sign * dx * r as f32) / params.dp).round();
                let fy = ((y as f32 + sign * dy * r as f32) / params.dp).round();
                if fx < 0.0 || fy < 0.0 {
                    break;
                }
                let (ax, ay) = (fx as usize, fy as usize);
                if ax >= acc_w || ay >= acc_h {
                    break;
                }
                let cell = ay * acc_w + ax;
                if cell != last_cell {
                    accum[cell] += 1;
                    last_cell = cell;
                }
            }
        }
    }

    // Rays through a true centre scatter over neighbouring cells
    let support = box_sum_3x3(&accum, acc_w, acc_h);
    let mut centres = local_maxima(&support, acc_w, acc_h, params.vote_threshold);
    centres.sort_by(|a, b| b.1.cmp(&a.1));

    let mut circles: Vec<Circle> = Vec::new();
    let min_dist_sq = params.min_dist * params.min_dist;
    for (cell, _) in centres {
        let (cx, cy) = refine_centre(&accum, acc_w, acc_h, cell, params.dp);

        let crowded = circles.iter().any(|c| {
            let (ddx, ddy) = (c.x - cx, c.y - cy);
            ddx * ddx + ddy * ddy < min_dist_sq
        });
        if crowded {
            continue;
        }

        if let Some(radius) = estimate_radius(&edge_points, cx, cy, params) {
            circles.push(Circle { x: cx, y: cy, radius });
        }
    }

    circles
}

/// Sum of each cell and its 8 neighbours.
fn box_sum_3x3(accum: &[u32], w: usize, h: usize) -> Vec<u32> {
    let mut out = vec![0u32; accum.len()];
    for y in 0..h {
        for x in 0..w {
            let mut sum = 0;
            for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
                for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                    sum += accum[ny * w + nx];
                }
            }
            out[y * w + x] = sum;
        }
    }
    out
}

/// Vote-weighted centre of the 3x3 cells around `cell`, in pixels.
fn refine_centre(accum: &[u32], w: usize, h: usize, cell: usize, dp: f32) -> (f32, f32) {
    let (x, y) = (cell % w, cell / w);
    let (mut sx, mut sy, mut total) = (0f32, 0f32, 0f32);
    for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
        for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
            let v = accum[ny * w + nx] as f32;
            sx += v * nx as f32;
            sy += v * ny as f32;
            total += v;
        }
    }
    if total == 0.0 {
        return (x as f32 * dp, y as f32 * dp);
    }
    (sx / total * dp, sy / total * dp)
}

/// Cells with at least `threshold` votes that are maximal in their
/// 8-neighbourhood.
///
/// Ties go to the cell with the lower index.
fn local_maxima(accum: &[u32], w: usize, h: usize, threshold: u32) -> Vec<(usize, u32)> {
    let mut peaks = Vec::new();
    for y in 0..h {
        for x in 0..w {
            let idx = y * w + x;
            let val = accum[idx];
            if val == 0 || val < threshold {
                continue;
            }
            let mut is_max = true;
            'scan: for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
                for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                    let nidx = ny * w + nx;
                    if nidx == idx {
                        continue;
                    }
                    if accum[nidx] > val || (accum[nidx] == val && nidx < idx) {
                        is_max = false;
                        break 'scan;
                    }
                }
            }
            if is_max {
                peaks.push((idx, val));
            }
        }
    }
    peaks
}

/// Best-supported radius for a centre, if enough edge pixels agree on it.
///
/// Support for radius `r` counts edge pixels at rounded distance `r - 1..=r + 1`.
fn estimate_radius(edge_points: &[(u32, u32)], cx: f32, cy: f32, params: &CircleParams) -> Option<f32> {
    let max_r = params.max_radius as usize;
    let mut histogram = vec![0u32; max_r + 2];
    let mut distance_sums = vec![0f32; max_r + 2];

    for &(x, y) in edge_points {
        let d = ((x as f32 - cx).powi(2) + (y as f32 - cy).powi(2)).sqrt();
        let bin = d.round() as usize;
        if bin + 1 < params.min_radius as usize || bin > max_r + 1 {
            continue;
        }
        histogram[bin] += 1;
        distance_sums[bin] += d;
    }

    let (best, support) = (params.min_radius as usize..=max_r)
        .map(|r| {
            let lo = r.saturating_sub(1);
            (r, histogram[lo..=r + 1].iter().sum::<u32>())
        })
        .max_by_key(|&(_, support)| support)?;

    if support < params.vote_threshold {
        return None;
    }
    let lo = best.saturating_sub(1);
    let sum: f32 = distance_sums[lo..=best + 1].iter().sum();
    Some(sum / support as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma};

    fn disc_image(w: u32, h: u32, discs: &[(f32, f32, f32, u8)]) -> GrayImage {
        ImageBuffer::from_fn(w, h, |x, y| {
            for &(cx, cy, r, v) in discs {
                let (dx, dy) = (x as f32 - cx, y as f32 - cy);
                if dx * dx + dy * dy <= r * r {
                    return Luma([v]);
                }
            }
            Luma([0])
        })
    }

    fn params() -> CircleParams {
        CircleParams {
            dp: 1.0,
            min_dist: 5.0,
            edge_threshold: 50.0,
            vote_threshold: 30,
            min_radius: 10,
            max_radius: 30,
        }
    }

    #[test]
    fn test_single_disc() {
        let img = disc_image(100, 100, &[(50.0, 45.0, 15.0, 220)]);
        let circles = detect_circles(&img, &params());

        assert_eq!(circles.len(), 1, "{circles:?}");
        let c = circles[0];
        assert!((c.x - 50.0).abs() <= 2.0 && (c.y - 45.0).abs() <= 2.0, "{c:?}");
        assert!((c.radius - 15.0).abs() <= 2.0, "{c:?}");
    }

    #[test]
    fn test_radius_out_of_range_is_ignored() {
        let img = disc_image(100, 100, &[(50.0, 50.0, 5.0, 220)]);
        assert!(detect_circles(&img, &params()).is_empty());
    }

    #[test]
    fn test_blank_and_degenerate_inputs() {
        assert!(detect_circles(&GrayImage::new(50, 50), &params()).is_empty());
        assert!(detect_circles(&GrayImage::new(2, 2), &params()).is_empty());
        let bad = CircleParams {
            min_radius: 20,
            max_radius: 10,
            ..params()
        };
        let img = disc_image(100, 100, &[(50.0, 50.0, 15.0, 220)]);
        assert!(detect_circles(&img, &bad).is_empty());
    }

    #[test]
    fn test_small_disc_with_fine_radius_range() {
        let img = disc_image(80, 80, &[(30.0, 40.0, 6.0, 230)]);
        let params = CircleParams {
            dp: 1.0,
            min_dist: 3.0,
            edge_threshold: 100.0,
            vote_threshold: 20,
            min_radius: 3,
            max_radius: 10,
        };
        let circles = detect_circles(&img, &params);

        assert_eq!(circles.len(), 1, "{circles:?}");
        let c = circles[0];
        assert!((c.x - 30.0).abs() <= 1.5 && (c.y - 40.0).abs() <= 1.5, "{c:?}");
        assert!((c.radius - 6.0).abs() <= 1.5, "{c:?}");
    }

    #[test]
    fn test_coarse_accumulator_keeps_pixel_centres() {
        let img = disc_image(120, 100, &[(60.0, 50.0, 14.0, 250)]);
        let params = CircleParams { dp: 1.2, ..params() };
        let circles = detect_circles(&img, &params);

        assert_eq!(circles.len(), 1, "{circles:?}");
        assert!((circles[0].x - 60.0).abs() <= 2.0, "{:?}", circles[0]);
        assert!((circles[0].y - 50.0).abs() <= 2.0, "{:?}", circles[0]);
    }

    #[test]
    fn test_box_sum_and_refine() {
        let mut accum = vec![0u32; 9];
        accum[4] = 4;
        accum[5] = 4;
        assert_eq!(box_sum_3x3(&accum, 3, 3), vec![4, 8, 8, 4, 8, 8, 4, 8, 8]);
        let (x, y) = refine_centre(&accum, 3, 3, 4, 2.0);
        assert!((x - 3.0).abs() < 1e-6 && (y - 2.0).abs() < 1e-6, "({x}, {y})");
    }

    #[test]
    fn test_local_maxima_tie_break() {
        let accum = vec![0, 5, 5, 0, 0, 0];
        let peaks = local_maxima(&accum, 3, 2, 1);
        assert_eq!(peaks, vec![(1, 5)]);
    }
}
