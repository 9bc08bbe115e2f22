//! vidpress - video compressor driving ffmpeg
//!
//! All media work is delegated to the external ffmpeg/ffprobe binaries;
//! this crate builds their argument lists, runs them, and parses their
//! progress output.

pub mod engine;

pub use engine::{CompressError, CompressionOptions, JobRunner, MediaProbe, Tools};
