//! Video decoding through the `ffmpeg` / `ffprobe` command-line tools.

use anyhow::{Context, anyhow};
use serde::Deserialize;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

use super::FrameSource;
use crate::error::{Result, TelemetryError};
use crate::raster::Frame;

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
}

/// Decodes a video file to raw RGB24 frames piped from an `ffmpeg` child.
///
/// The decoder is spawned lazily on the first read so that a preceding
/// [`FrameSource::seek`] becomes an input seek (`-ss`).
#[derive(Debug)]
pub struct FfmpegSource {
    path: PathBuf,
    width: u32,
    height: u32,
    start_ms: u64,
    decoder: Option<(Child, ChildStdout)>,
    exhausted: bool,
}

impl FfmpegSource {
    /// Probes `path` for its frame size. Fails if `ffprobe` is missing or the
    /// file has no video stream.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let (width, height) = probe_dimensions(path)?;
        log::info!("Video {}: {}x{}", path.display(), width, height);
        Ok(Self {
            path: path.to_path_buf(),
            width,
            height,
            start_ms: 0,
            decoder: None,
            exhausted: false,
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn spawn_decoder(&self) -> anyhow::Result<(Child, ChildStdout)> {
        let start = format!("{:.3}", self.start_ms as f64 / 1000.0);
        let mut child = Command::new("ffmpeg")
            .args(["-v", "error", "-nostdin", "-ss", &start, "-i"])
            .arg(&self.path)
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .context("Failed to start ffmpeg (is it installed?)")?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("ffmpeg stdout was not captured"))?;
        Ok((child, stdout))
    }
}

impl FrameSource for FfmpegSource {
    fn seek(&mut self, start_ms: u64) -> Result<()> {
        if self.decoder.is_some() {
            return Err(TelemetryError::Source("seek after the first read".to_string()));
        }
        self.start_ms = start_ms;
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.exhausted {
            return Ok(None);
        }
        if self.decoder.is_none() {
            let decoder = self
                .spawn_decoder()
                .map_err(|e| TelemetryError::Source(format!("{e:#}")))?;
            self.decoder = Some(decoder);
        }
        let Some((_, stdout)) = self.decoder.as_mut() else {
            return Ok(None);
        };

        let mut buf = vec![0u8; self.width as usize * self.height as usize * 3];
        match read_full(stdout, &mut buf)? {
            0 => {
                self.exhausted = true;
                Ok(None)
            }
            n if n < buf.len() => {
                self.exhausted = true;
                Err(TelemetryError::Source(format!(
                    "truncated frame: {n} of {} bytes",
                    buf.len()
                )))
            }
            _ => Frame::from_raw(self.width, self.height, buf)
                .map(Some)
                .ok_or_else(|| TelemetryError::Source("frame buffer size mismatch".to_string())),
        }
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        if let Some((mut child, _)) = self.decoder.take() {
            // Stopping early leaves ffmpeg blocked on a full pipe
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Reads until `buf` is full or EOF; returns the number of bytes read.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn probe_dimensions(path: &Path) -> anyhow::Result<(u32, u32)> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height",
            "-of",
            "json",
        ])
        .arg(path)
        .output()
        .context("Failed to run ffprobe (is ffmpeg installed?)")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("ffprobe failed for {}: {}", path.display(), stderr.trim()));
    }
    parse_probe(&output.stdout).with_context(|| format!("No video stream in {}", path.display()))
}

fn parse_probe(json: &[u8]) -> anyhow::Result<(u32, u32)> {
    let probe: ProbeOutput = serde_json::from_slice(json)?;
    probe
        .streams
        .iter()
        .find_map(|s| match (s.width, s.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
            _ => None,
        })
        .ok_or_else(|| anyhow!("ffprobe reported no frame size"))
}
