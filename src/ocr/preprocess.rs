use image::{ImageBuffer, Rgb, RgbImage};

use crate::raster::channel_mean;

/// Below this brightest channel-mean a readout slot is treated as empty.
pub const DEFAULT_BRIGHTNESS_FLOOR: f32 = 200.0;

/// Offset added to the median before background subtraction.
const BACKGROUND_OFFSET: f32 = 5.0;

/// Prepares a cropped readout for text recognition.
///
/// If no pixel has a channel-mean of at least `brightness_floor` the slot is
/// considered textless and an all-black image is returned, so the recognizer
/// cannot hallucinate digits on an empty HUD element.
///
/// Otherwise `median + 5` of all samples is subtracted from every sample and
/// each channel is rescaled so its maximum maps to 255, clipped to [0, 255].
pub fn normalize_for_ocr(img: &RgbImage, brightness_floor: f32) -> RgbImage {
    let (width, height) = img.dimensions();

    let brightest = img.pixels().map(channel_mean).fold(0.0f32, f32::max);
    if brightest < brightness_floor {
        return RgbImage::new(width, height);
    }

    let background = median(img.as_raw()) + BACKGROUND_OFFSET;

    let mut channel_max = [f32::MIN; 3];
    for pixel in img.pixels() {
        for c in 0..3 {
            channel_max[c] = channel_max[c].max(pixel[c] as f32 - background);
        }
    }
    // Nothing above the background: leave unscaled so clipping blanks it
    let scale = if channel_max.iter().all(|&m| m > 0.0) {
        channel_max.map(|m| 255.0 / m)
    } else {
        [1.0; 3]
    };

    ImageBuffer::from_fn(width, height, |x, y| {
        let p = img.get_pixel(x, y);
        let mut out = [0u8; 3];
        for c in 0..3 {
            let v = (p[c] as f32 - background) * scale[c];
            out[c] = v.clamp(0.0, 255.0) as u8;
        }
        Rgb(out)
    })
}

/// Median over all samples; even counts average the two middle values.
fn median(samples: &[u8]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    // Counting sort, samples are bytes
    let mut histogram = [0usize; 256];
    for &s in samples {
        histogram[s as usize] += 1;
    }
    let nth = |n: usize| {
        let mut seen = 0;
        for (value, &count) in histogram.iter().enumerate() {
            seen += count;
            if seen > n {
                return value as f32;
            }
        }
        255.0
    };
    let len = samples.len();
    if len % 2 == 1 {
        nth(len / 2)
    } else {
        (nth(len / 2 - 1) + nth(len / 2)) / 2.0
    }
}
