// Builds the ffmpeg argument list from compression options.
// Pure: options + probe in, argument plan out. No I/O.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::error::CompressError;
use super::options::{CompressionOptions, Container, FrameRateTarget};
use super::probe::MediaProbe;

/// Fixed rate-control policy: when a target bitrate is set, the max rate
/// is 1.5x the target and the buffer is 2x the target.
pub const MAXRATE_FACTOR: f64 = 1.5;
pub const BUFSIZE_FACTOR: f64 = 2.0;

/// The encoder argument list for one job, plus the duration the runner
/// uses to turn timestamps into percentages.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentPlan {
    /// Arguments between `-i INPUT` and the output path.
    pub args: Vec<String>,
    pub duration_s: f64,
}

/// Codec pair for a container. Fixed table: the web-optimized container
/// gets VP9/Opus, the legacy container gets MPEG-4/MP3, everything else
/// gets the H.264/AAC default pair.
fn codec_pair(container: Container) -> (&'static str, &'static str) {
    match container {
        Container::Webm => ("libvpx-vp9", "libopus"),
        Container::Avi => ("mpeg4", "libmp3lame"),
        Container::Mp4 | Container::Mov | Container::Mkv => ("libx264", "aac"),
    }
}

/// Build the argument plan for one job.
///
/// Deterministic over valid options: identical inputs produce an
/// identical plan.
pub fn build(
    options: &CompressionOptions,
    probe: &MediaProbe,
) -> Result<ArgumentPlan, CompressError> {
    Ok(ArgumentPlan {
        args: encoder_args(options)?,
        duration_s: probe.duration_s,
    })
}

/// The encoder arguments for a set of options, validated. Also used by
/// the runner to rebuild a job's plan at launch time.
pub fn encoder_args(options: &CompressionOptions) -> Result<Vec<String>, CompressError> {
    options.validate()?;

    let (video_codec, audio_codec) = codec_pair(options.container);

    let mut args: Vec<String> = Vec::new();
    args.push("-c:v".into());
    args.push(video_codec.into());
    args.push("-preset".into());
    args.push(options.preset.as_str().into());

    // Quality is always passed; with a bitrate set the encoder treats it
    // as a ceiling (delegated behavior, not validated here).
    args.push("-crf".into());
    args.push(options.quality.to_string());

    if options.bitrate_kbps > 0 {
        let target = options.bitrate_kbps;
        let maxrate = (target as f64 * MAXRATE_FACTOR) as u32;
        let bufsize = (target as f64 * BUFSIZE_FACTOR) as u32;
        args.push("-b:v".into());
        args.push(format!("{target}k"));
        args.push("-maxrate".into());
        args.push(format!("{maxrate}k"));
        args.push("-bufsize".into());
        args.push(format!("{bufsize}k"));
    }

    let mut filters: Vec<String> = Vec::new();
    if let Some((w, h)) = options.resolution.dimensions() {
        filters.push(format!("scale={w}:{h}"));
    }
    if let FrameRateTarget::Fixed(fps) = options.frame_rate {
        filters.push(format!("fps={fps}"));
    }
    if !filters.is_empty() {
        args.push("-vf".into());
        args.push(filters.join(","));
    }

    args.push("-c:a".into());
    args.push(audio_codec.into());

    Ok(args)
}

impl ArgumentPlan {
    /// Assemble the full ffmpeg invocation for this plan.
    pub fn to_command(&self, ffmpeg: &Path, input: &Path, output: &Path) -> Command {
        let mut cmd = Command::new(ffmpeg);
        cmd.arg("-i").arg(input);
        cmd.args(&self.args);
        cmd.arg("-y");
        cmd.arg(output);
        cmd
    }

    /// Shell-safe rendering of the full command, for dry runs and logs.
    pub fn render(&self, ffmpeg: &Path, input: &Path, output: &Path) -> String {
        let cmd = self.to_command(ffmpeg, input, output);
        let mut words: Vec<OsString> = vec![cmd.get_program().to_os_string()];
        words.extend(cmd.get_args().map(|a| a.to_os_string()));
        let words: Vec<String> = words
            .into_iter()
            .map(|w| w.to_string_lossy().into_owned())
            .collect();
        shlex::try_join(words.iter().map(String::as_str))
            .unwrap_or_else(|_| words.join(" "))
    }
}

/// Default output path next to the input: `{stem}_compressed.{ext}`.
pub fn derive_output_path(input: &Path, container: Container) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let parent = input.parent().unwrap_or_else(|| Path::new("."));
    parent.join(format!("{stem}_compressed.{}", container.extension()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::options::{Preset, ResolutionTarget};

    fn probe() -> MediaProbe {
        MediaProbe {
            width: 1920,
            height: 1080,
            duration_s: 100.0,
            has_video: true,
        }
    }

    #[test]
    fn test_build_is_deterministic() {
        let opts = CompressionOptions {
            quality: 28,
            preset: Preset::Slow,
            bitrate_kbps: 1000,
            resolution: ResolutionTarget::P720,
            frame_rate: FrameRateTarget::Fixed(30),
            container: Container::Webm,
        };
        let a = build(&opts, &probe()).unwrap();
        let b = build(&opts, &probe()).unwrap();
        assert_eq!(a, b, "identical inputs must produce an identical plan");
    }

    #[test]
    fn test_build_defaults_no_filters_no_bitrate() {
        let plan = build(&CompressionOptions::default(), &probe()).unwrap();
        assert!(!plan.args.contains(&"-vf".to_string()));
        assert!(!plan.args.contains(&"-b:v".to_string()));
        assert!(plan.args.contains(&"-crf".to_string()));
        assert!(plan.args.contains(&"23".to_string()));
        assert_eq!(plan.duration_s, 100.0);
    }

    #[test]
    fn test_build_bitrate_policy_multipliers() {
        let opts = CompressionOptions {
            bitrate_kbps: 1000,
            ..Default::default()
        };
        let plan = build(&opts, &probe()).unwrap();
        let joined = plan.args.join(" ");
        assert!(joined.contains("-b:v 1000k"));
        assert!(joined.contains("-maxrate 1500k"));
        assert!(joined.contains("-bufsize 2000k"));
    }

    #[test]
    fn test_build_scale_and_fps_filters() {
        let opts = CompressionOptions {
            resolution: ResolutionTarget::P1080,
            frame_rate: FrameRateTarget::Fixed(24),
            ..Default::default()
        };
        let plan = build(&opts, &probe()).unwrap();
        let vf_pos = plan.args.iter().position(|a| a == "-vf").unwrap();
        assert_eq!(plan.args[vf_pos + 1], "scale=1920:1080,fps=24");
    }

    #[test]
    fn test_codec_table() {
        for (container, video, audio) in [
            (Container::Mp4, "libx264", "aac"),
            (Container::Mov, "libx264", "aac"),
            (Container::Mkv, "libx264", "aac"),
            (Container::Webm, "libvpx-vp9", "libopus"),
            (Container::Avi, "mpeg4", "libmp3lame"),
        ] {
            let opts = CompressionOptions {
                container,
                ..Default::default()
            };
            let plan = build(&opts, &probe()).unwrap();
            let joined = plan.args.join(" ");
            assert!(joined.contains(&format!("-c:v {video}")), "{container}: {joined}");
            assert!(joined.contains(&format!("-c:a {audio}")), "{container}: {joined}");
        }
    }

    #[test]
    fn test_build_rejects_out_of_range_quality() {
        let opts = CompressionOptions {
            quality: 99,
            ..Default::default()
        };
        let err = build(&opts, &probe()).unwrap_err();
        assert!(matches!(err, CompressError::InvalidOptions(_)));
    }

    #[test]
    fn test_render_quotes_spaced_paths() {
        let plan = build(&CompressionOptions::default(), &probe()).unwrap();
        let rendered = plan.render(
            Path::new("ffmpeg"),
            Path::new("/tmp/my video.mp4"),
            Path::new("/tmp/out.mp4"),
        );
        assert!(rendered.starts_with("ffmpeg -i"));
        assert!(rendered.contains("'/tmp/my video.mp4'") || rendered.contains("\"/tmp/my video.mp4\""));
        assert!(rendered.ends_with("/tmp/out.mp4"));
    }

    #[test]
    fn test_derive_output_path() {
        let out = derive_output_path(Path::new("/videos/clip.mov"), Container::Webm);
        assert_eq!(out, PathBuf::from("/videos/clip_compressed.webm"));

        let out = derive_output_path(Path::new("clip.mp4"), Container::Mp4);
        assert_eq!(out, PathBuf::from("clip_compressed.mp4"));
    }
}
