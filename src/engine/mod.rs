// Core compression engine - independent of the CLI front-end

pub mod error;
pub mod options;
pub mod plan;
pub mod probe;
pub mod progress;
pub mod runner;
pub mod thumbnail;
pub mod tools;

pub use error::CompressError;
pub use options::{
    CompressionOptions, Container, FrameRateTarget, MAX_QUALITY, Preset, ResolutionTarget,
};
pub use plan::{ArgumentPlan, build, derive_output_path};
pub use probe::{MediaProbe, probe_media};
pub use progress::{ProgressEvent, ProgressParser};
pub use runner::{CompressionJob, CompressionSummary, JobHandle, JobRunner, JobState};
pub use tools::Tools;
