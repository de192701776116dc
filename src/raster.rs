//! Frame type and the cropping / intensity helpers shared by every measurement.

use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage};

use crate::error::TelemetryError;
use crate::profile::PixelRect;

/// One decoded video frame, RGB8.
pub type Frame = RgbImage;

/// Crops a sub-region, clamping the rectangle to the image bounds.
///
/// A rectangle that starts outside the image yields an empty image.
pub fn crop_region(img: &RgbImage, region: &PixelRect) -> RgbImage {
    let (w, h) = img.dimensions();

    let x0 = region.x.min(w);
    let y0 = region.y.min(h);
    let rw = region.width.min(w - x0);
    let rh = region.height.min(h - y0);

    image::imageops::crop_imm(img, x0, y0, rw, rh).to_image()
}

/// Crops a sub-region that must lie fully inside the image.
pub fn crop_checked(img: &RgbImage, region: &PixelRect) -> Result<RgbImage, TelemetryError> {
    let (w, h) = img.dimensions();
    if !region.fits_within(w, h) {
        return Err(TelemetryError::RegionOutOfBounds {
            region: *region,
            frame_width: w,
            frame_height: h,
        });
    }
    Ok(crop_region(img, region))
}

/// Mean of the three colour channels of one pixel.
pub fn channel_mean(pixel: &Rgb<u8>) -> f32 {
    (pixel[0] as f32 + pixel[1] as f32 + pixel[2] as f32) / 3.0
}

/// ITU-R BT.601 luma: Y = 0.299*R + 0.587*G + 0.114*B.
pub fn luma(pixel: &Rgb<u8>) -> f32 {
    0.299 * pixel[0] as f32 + 0.587 * pixel[1] as f32 + 0.114 * pixel[2] as f32
}

/// Converts to single-channel intensity using [`luma`].
pub fn to_gray(img: &RgbImage) -> GrayImage {
    let (width, height) = img.dimensions();
    ImageBuffer::from_fn(width, height, |x, y| {
        Luma([luma(img.get_pixel(x, y)).round().clamp(0.0, 255.0) as u8])
    })
}
