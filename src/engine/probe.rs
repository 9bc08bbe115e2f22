// Input probing using ffprobe

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Command;

use tracing::debug;

use super::error::CompressError;
use super::tools::Tools;

/// Stream metadata for one input file, read-only after creation.
/// Re-fetched whenever the input path changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MediaProbe {
    pub width: u32,
    pub height: u32,
    /// Duration in seconds. 0.0 means the container did not report one;
    /// progress is then indeterminate.
    pub duration_s: f64,
    pub has_video: bool,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

/// Probe a media file for dimensions, duration, and stream presence.
pub fn probe_media(tools: &Tools, path: &Path) -> Result<MediaProbe, CompressError> {
    let output = Command::new(&tools.ffprobe)
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()?;

    if !output.status.success() {
        return Err(CompressError::ProbeFailed(format!(
            "ffprobe failed for {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let json_str = String::from_utf8_lossy(&output.stdout);
    let probe = parse_probe_output(&json_str)?;
    debug!(
        width = probe.width,
        height = probe.height,
        duration_s = probe.duration_s,
        "probed {}",
        path.display()
    );
    Ok(probe)
}

/// Parse ffprobe JSON into a `MediaProbe`. Split out for testing.
pub fn parse_probe_output(json: &str) -> Result<MediaProbe, CompressError> {
    let parsed: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| CompressError::ProbeFailed(format!("unparseable ffprobe output: {e}")))?;

    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"));

    let Some(video) = video else {
        return Err(CompressError::ProbeFailed(
            "no video stream in input".to_string(),
        ));
    };

    let width = video.width.unwrap_or(0);
    let height = video.height.unwrap_or(0);
    if width == 0 || height == 0 {
        return Err(CompressError::ProbeFailed(
            "video stream has no dimensions".to_string(),
        ));
    }

    // A missing duration is not fatal; the runner degrades to
    // indeterminate progress.
    let duration_s = parsed
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| *d >= 0.0)
        .unwrap_or(0.0);

    Ok(MediaProbe {
        width,
        height,
        duration_s,
        has_video: true,
    })
}
