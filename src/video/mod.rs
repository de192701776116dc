//! Frame sources.
//!
//! A source yields frames in presentation order, can seek once before the
//! first read, and reports exhaustion as `Ok(None)`; errors are read failures
//! the caller may retry.

pub mod ffmpeg;
pub mod sequence;

pub use ffmpeg::FfmpegSource;
pub use sequence::ImageSequenceSource;

use crate::error::Result;
use crate::raster::Frame;

pub trait FrameSource {
    /// Positions the source at `start_ms`. Only valid before the first read.
    fn seek(&mut self, start_ms: u64) -> Result<()>;

    /// Next frame, or `None` once the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn seek(&mut self, start_ms: u64) -> Result<()> {
        (**self).seek(start_ms)
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        (**self).next_frame()
    }
}
