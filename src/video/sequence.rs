use std::fs;
use std::path::{Path, PathBuf};

use super::FrameSource;
use crate::error::{Result, TelemetryError};
use crate::raster::Frame;

const FRAME_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// A directory of still frames, read in file-name order.
///
/// `fps` is only used to translate a seek time into a frame offset.
#[derive(Debug)]
pub struct ImageSequenceSource {
    frames: Vec<PathBuf>,
    next: usize,
    fps: f64,
    started: bool,
}

impl ImageSequenceSource {
    pub fn open(dir: &Path, fps: f64) -> Result<Self> {
        if fps.is_nan() || fps <= 0.0 {
            return Err(TelemetryError::Configuration(format!(
                "frame rate must be positive, got {fps}"
            )));
        }
        let mut frames: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| FRAME_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            })
            .collect();
        frames.sort();

        log::info!("{} frames found in {}", frames.len(), dir.display());
        Ok(Self {
            frames,
            next: 0,
            fps,
            started: false,
        })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FrameSource for ImageSequenceSource {
    fn seek(&mut self, start_ms: u64) -> Result<()> {
        if self.started {
            return Err(TelemetryError::Source("seek after the first read".to_string()));
        }
        self.next = ((start_ms as f64 / 1000.0) * self.fps).round() as usize;
        log::debug!("seek {start_ms} ms -> frame {}", self.next);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        self.started = true;
        let Some(path) = self.frames.get(self.next) else {
            return Ok(None);
        };
        // Advance first so an unreadable file is skipped on retry
        self.next += 1;
        image::open(path)
            .map(|img| Some(img.to_rgb8()))
            .map_err(|e| TelemetryError::Source(format!("{}: {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::tempdir;

    fn write_frames(dir: &Path, count: u8) {
        for i in 0..count {
            RgbImage::from_pixel(4, 4, Rgb([i, i, i]))
                .save(dir.join(format!("frame_{i:04}.png")))
                .unwrap();
        }
        std::fs::write(dir.join("notes.txt"), "not a frame").unwrap();
    }

    #[test]
    fn test_reads_in_order_then_exhausts() {
        let dir = tempdir().unwrap();
        write_frames(dir.path(), 3);

        let mut source = ImageSequenceSource::open(dir.path(), 30.0).unwrap();
        assert_eq!(source.len(), 3);
        for i in 0..3u8 {
            let frame = source.next_frame().unwrap().unwrap();
            assert_eq!(frame.get_pixel(0, 0)[0], i);
        }
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_seek_skips_frames() {
        let dir = tempdir().unwrap();
        write_frames(dir.path(), 5);

        let mut source = ImageSequenceSource::open(dir.path(), 2.0).unwrap();
        source.seek(1500).unwrap();
        let frame = source.next_frame().unwrap().unwrap();
        assert_eq!(frame.get_pixel(0, 0)[0], 3);
        assert!(source.seek(0).is_err());
    }

    #[test]
    fn test_unreadable_frame_is_error_then_continues() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.png"), b"garbage").unwrap();
        RgbImage::new(2, 2).save(dir.path().join("b.png")).unwrap();

        let mut source = ImageSequenceSource::open(dir.path(), 25.0).unwrap();
        assert!(source.next_frame().is_err());
        assert!(source.next_frame().unwrap().is_some());
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_rejects_bad_fps() {
        let dir = tempdir().unwrap();
        assert!(ImageSequenceSource::open(dir.path(), 0.0).is_err());
    }
}
