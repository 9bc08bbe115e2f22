// Locating the external encoding engine (ffmpeg + ffprobe)

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};

use super::error::CompressError;

/// Resolved paths to the external engine binaries.
#[derive(Debug, Clone)]
pub struct Tools {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Tools {
    /// Locate ffmpeg and ffprobe on PATH. Fails with `EngineNotFound`
    /// before any process is spawned.
    pub fn locate() -> Result<Self, CompressError> {
        Ok(Self {
            ffmpeg: resolve_bin("ffmpeg")?,
            ffprobe: resolve_bin("ffprobe")?,
        })
    }

    /// Build from explicit paths, bypassing PATH lookup. Used by tests
    /// to substitute a scripted engine.
    pub fn with_paths(ffmpeg: PathBuf, ffprobe: PathBuf) -> Self {
        Self { ffmpeg, ffprobe }
    }
}

fn resolve_bin(name: &str) -> Result<PathBuf, CompressError> {
    which::which(name).map_err(|_| CompressError::EngineNotFound(name.to_string()))
}

/// Check that ffmpeg runs and return its version banner line.
pub fn ffmpeg_version(tools: &Tools) -> Result<String> {
    version_line(&tools.ffmpeg)
}

/// Check that ffprobe runs and return its version banner line.
pub fn ffprobe_version(tools: &Tools) -> Result<String> {
    version_line(&tools.ffprobe)
}

fn version_line(bin: &Path) -> Result<String> {
    let output = Command::new(bin)
        .arg("-version")
        .output()
        .with_context(|| format!("Failed to execute {}", bin.display()))?;

    if !output.status.success() {
        anyhow::bail!("{} failed with status: {}", bin.display(), output.status);
    }

    let version_output = String::from_utf8_lossy(&output.stdout);
    let first_line = version_output.lines().next().unwrap_or("Unknown version");

    Ok(first_line.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_missing_binary_is_engine_not_found() {
        let err = resolve_bin("definitely-not-a-real-encoder-binary").unwrap_err();
        assert!(matches!(err, CompressError::EngineNotFound(_)));
        assert!(err.to_string().contains("definitely-not-a-real-encoder-binary"));
    }
}
