//! Frame file readers and writers.
//!
//! Two layouts are understood: a JSON array of frames, and JSON Lines with
//! one frame per line.

use std::fs;
use std::path::Path;

use contracts::{CapabilitiesReport, Frame};
use tracing::{debug, instrument};

use crate::error::{IngestionError, Result};

/// On-disk frame layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    /// `[{...}, {...}]`
    Json,
    /// One frame object per line; blank lines skipped
    JsonLines,
}

impl FrameFormat {
    /// Detect from file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "json" => Ok(Self::Json),
            "jsonl" | "ndjson" => Ok(Self::JsonLines),
            _ => Err(IngestionError::UnsupportedFormat { extension }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::JsonLines => "jsonl",
        }
    }
}

/// Frame file reader
pub struct FrameReader;

impl FrameReader {
    /// Read a frame file, detecting the layout from its extension
    #[instrument(name = "frame_reader_read_path", skip_all, fields(path = %path.as_ref().display()))]
    pub fn read_path(path: impl AsRef<Path>) -> Result<Vec<Frame>> {
        let path = path.as_ref();
        let format = FrameFormat::from_path(path)?;
        let content = fs::read_to_string(path).map_err(|e| IngestionError::io(path, e))?;
        let frames = Self::read_str(&content, format)?;
        debug!(frames = frames.len(), format = format.as_str(), "frames loaded");
        metrics::counter!("ride_frames_read_total", "format" => format.as_str())
            .increment(frames.len() as u64);
        Ok(frames)
    }

    /// Parse in-memory content
    pub fn read_str(content: &str, format: FrameFormat) -> Result<Vec<Frame>> {
        match format {
            FrameFormat::Json => {
                serde_json::from_str(content).map_err(|e| IngestionError::ParseFailed {
                    line: e.line(),
                    message: e.to_string(),
                })
            }
            FrameFormat::JsonLines => content
                .lines()
                .enumerate()
                .filter(|(_, line)| !line.trim().is_empty())
                .map(|(idx, line)| {
                    serde_json::from_str(line).map_err(|e| IngestionError::ParseFailed {
                        line: idx + 1,
                        message: e.to_string(),
                    })
                })
                .collect(),
        }
    }

    /// Read a capabilities report from a JSON file
    pub fn read_capabilities(path: impl AsRef<Path>) -> Result<CapabilitiesReport> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| IngestionError::io(path, e))?;
        serde_json::from_str(&content).map_err(|e| IngestionError::ParseFailed {
            line: e.line(),
            message: e.to_string(),
        })
    }
}

/// First field of `frame` that JSON cannot carry
fn non_finite_field(frame: &Frame) -> Option<&'static str> {
    if !frame.acc_g.is_finite() {
        return Some("accG");
    }
    if frame.lin_acc.is_some_and(|v| !v.is_finite()) {
        return Some("linAcc");
    }
    if frame.gyro_rate.is_some_and(|g| !g.is_finite()) {
        return Some("gyroRate");
    }
    let fix = frame.gps?;
    [
        ("gps.latitude", Some(fix.latitude)),
        ("gps.longitude", Some(fix.longitude)),
        ("gps.accuracy", Some(fix.accuracy)),
        ("gps.speed", fix.speed),
        ("gps.heading", fix.heading),
    ]
    .into_iter()
    .find(|(_, value)| value.is_some_and(|v| !v.is_finite()))
    .map(|(field, _)| field)
}

/// Serialize frames in the given layout.
///
/// Non-finite values are rejected rather than written as `null`.
pub fn write_frames(frames: &[Frame], format: FrameFormat) -> Result<String> {
    if let Some((index, field)) = frames
        .iter()
        .enumerate()
        .find_map(|(index, frame)| non_finite_field(frame).map(|field| (index, field)))
    {
        return Err(IngestionError::NonFiniteValue { index, field });
    }
    match format {
        FrameFormat::Json => Ok(serde_json::to_string_pretty(frames)?),
        FrameFormat::JsonLines => {
            let mut out = String::new();
            for frame in frames {
                out.push_str(&serde_json::to_string(frame)?);
                out.push('\n');
            }
            Ok(out)
        }
    }
}

/// Write frames to `path` in the layout its extension names
pub fn write_frames_to_path(path: impl AsRef<Path>, frames: &[Frame]) -> Result<FrameFormat> {
    let path = path.as_ref();
    let format = FrameFormat::from_path(path)?;
    let content = write_frames(frames, format)?;
    fs::write(path, content).map_err(|e| IngestionError::io(path, e))?;
    Ok(format)
}
