use anyhow::{Result, anyhow};
use image::RgbImage;
use std::process::Command;
use tempfile::NamedTempFile;

use super::setup::TesseractPaths;

/// Image-to-text service used for the numeric readouts.
///
/// Implementations never fail: unreadable input yields an empty or garbage
/// string, which the extraction stage tolerates.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, img: &RgbImage) -> String;
}

/// Runs the Tesseract CLI once per image.
#[derive(Clone, Debug)]
pub struct TesseractRecognizer {
    paths: TesseractPaths,
    page_seg_mode: u8,
}

impl TesseractRecognizer {
    pub fn new(paths: TesseractPaths, page_seg_mode: u8) -> Self {
        Self {
            paths,
            page_seg_mode,
        }
    }

    /// Runs Tesseract to stdout on a single-line readout.
    fn run(&self, img: &RgbImage) -> Result<String> {
        // Save image to temporary file
        let temp_input = NamedTempFile::with_suffix(".png")?;
        img.save(temp_input.path())?;

        let mut cmd = Command::new(&self.paths.executable);
        cmd.arg(temp_input.path()).arg("stdout");
        if let Some(dir) = &self.paths.tessdata {
            cmd.arg("--tessdata-dir").arg(dir);
        }
        let output = cmd
            .arg("-l")
            .arg("eng")
            .arg("--oem")
            .arg("3")
            .arg("--psm")
            .arg(self.page_seg_mode.to_string())
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Tesseract failed: {}", stderr.trim()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, img: &RgbImage) -> String {
        // Blank readouts never contain text; skip the subprocess
        if img.width() == 0 || img.height() == 0 {
            return String::new();
        }
        match self.run(img) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("OCR failed, treating readout as empty: {e:#}");
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_missing_executable_yields_empty_string() {
        let recognizer = TesseractRecognizer::new(
            TesseractPaths {
                executable: PathBuf::from("/nonexistent/tesseract"),
                tessdata: None,
            },
            7,
        );
        let img = RgbImage::new(4, 4);
        assert_eq!(recognizer.recognize(&img), "");
    }

    #[test]
    fn test_empty_image_skips_subprocess() {
        let recognizer = TesseractRecognizer::new(
            TesseractPaths {
                executable: PathBuf::from("/nonexistent/tesseract"),
                tessdata: None,
            },
            7,
        );
        assert_eq!(recognizer.recognize(&RgbImage::new(0, 3)), "");
    }
}
