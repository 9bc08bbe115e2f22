use clap::{Parser, Subcommand};
use std::path::PathBuf;

use vidpress::engine::options::{Container, FrameRateTarget, Preset, ResolutionTarget};

#[derive(Parser)]
#[command(name = "vidpress")]
#[command(version, about = "Compress videos with ffmpeg", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose logging (equivalent to RUST_LOG=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(clap::Args)]
pub struct EncodeArgs {
    /// Input video file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output file (default: <input>_compressed.<container>)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Quality level 0-51, lower = higher fidelity
    #[arg(short, long, default_value_t = 23)]
    pub quality: u8,

    /// Encoding speed preset (ultrafast..placebo)
    #[arg(short, long, default_value = "medium")]
    pub preset: Preset,

    /// Target bitrate in kbps, 0 = quality-driven
    #[arg(short, long, default_value_t = 0)]
    pub bitrate: u32,

    /// Resolution target (source, 2160p, 1440p, 1080p, 720p, 480p, 360p)
    #[arg(short, long, default_value = "source")]
    pub resolution: ResolutionTarget,

    /// Frame rate target (source, 24, 25, 30, 50, 60)
    #[arg(short, long, default_value = "source")]
    pub fps: FrameRateTarget,

    /// Output container (mp4, mov, mkv, avi, webm)
    #[arg(short, long, default_value = "mp4")]
    pub container: Container,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check that ffmpeg and ffprobe are installed
    CheckFfmpeg,

    /// Probe a video file for dimensions and duration
    Probe {
        /// Path to the video file
        file: PathBuf,

        /// Print the probe result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the ffmpeg command for a job without running it
    Plan {
        #[command(flatten)]
        encode: EncodeArgs,
    },

    /// Compress a video, printing progress and a final summary
    Run {
        #[command(flatten)]
        encode: EncodeArgs,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract a preview frame (1 second in, scaled down)
    Thumbnail {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Output image file
        #[arg(short, long)]
        output: PathBuf,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}
