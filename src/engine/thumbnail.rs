// Single-frame preview extraction. Best-effort: callers degrade to a
// textual placeholder on failure, never abort a job over it.

use std::path::Path;
use std::process::{Command, Stdio};

use tracing::debug;

use super::error::CompressError;
use super::tools::Tools;

/// Offset into the source where the preview frame is taken.
const THUMBNAIL_OFFSET_S: u32 = 1;
/// Preview is scaled to this width, height follows the aspect ratio.
const THUMBNAIL_WIDTH: u32 = 320;

/// Extract one frame at a fixed offset, scaled to a bounded preview size.
pub fn extract_thumbnail(tools: &Tools, input: &Path, output: &Path) -> Result<(), CompressError> {
    let output_cmd = Command::new(&tools.ffmpeg)
        .arg("-ss")
        .arg(THUMBNAIL_OFFSET_S.to_string())
        .arg("-i")
        .arg(input)
        .args(["-frames:v", "1"])
        .arg("-vf")
        .arg(format!("scale={THUMBNAIL_WIDTH}:-2"))
        .arg("-y")
        .arg(output)
        .stdin(Stdio::null())
        .output()?;

    if !output_cmd.status.success() {
        let stderr = String::from_utf8_lossy(&output_cmd.stderr);
        let tail: Vec<&str> = stderr.lines().rev().take(3).collect();
        return Err(CompressError::RunFailed {
            exit_code: output_cmd.status.code(),
            stderr_tail: tail.into_iter().rev().collect::<Vec<_>>().join("\n"),
        });
    }

    debug!("thumbnail written to {}", output.display());
    Ok(())
}
