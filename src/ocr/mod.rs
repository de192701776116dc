pub mod engine;
pub mod extract;
pub mod preprocess;
pub mod setup;

pub use engine::{TesseractRecognizer, TextRecognizer};
pub use extract::{extract_altitude, extract_clock, extract_speed};
pub use preprocess::normalize_for_ocr;
pub use setup::locate_tesseract;

use image::RgbImage;

/// Normalizes a cropped readout and runs it through the recognizer.
pub fn read_region(
    recognizer: &dyn TextRecognizer,
    region: &RgbImage,
    brightness_floor: f32,
) -> String {
    let cleaned = normalize_for_ocr(region, brightness_floor);
    recognizer.recognize(&cleaned)
}
