// User-facing compression options and their fixed value sets

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::CompressError;

/// x264-style speed/efficiency trade-off labels, ordered fastest to slowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Ultrafast,
    Superfast,
    Veryfast,
    Faster,
    Fast,
    Medium,
    Slow,
    Slower,
    Veryslow,
    Placebo,
}

impl Preset {
    pub const ALL: [Preset; 10] = [
        Preset::Ultrafast,
        Preset::Superfast,
        Preset::Veryfast,
        Preset::Faster,
        Preset::Fast,
        Preset::Medium,
        Preset::Slow,
        Preset::Slower,
        Preset::Veryslow,
        Preset::Placebo,
    ];

    /// The label ffmpeg consumes verbatim.
    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Ultrafast => "ultrafast",
            Preset::Superfast => "superfast",
            Preset::Veryfast => "veryfast",
            Preset::Faster => "faster",
            Preset::Fast => "fast",
            Preset::Medium => "medium",
            Preset::Slow => "slow",
            Preset::Slower => "slower",
            Preset::Veryslow => "veryslow",
            Preset::Placebo => "placebo",
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preset {
    type Err = CompressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .iter()
            .find(|p| p.as_str() == s)
            .copied()
            .ok_or_else(|| {
                CompressError::InvalidOptions(format!(
                    "unknown preset '{s}' (expected one of: ultrafast..placebo)"
                ))
            })
    }
}

/// Resolution target: keep the source size, or scale to a standard height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionTarget {
    Source,
    P2160,
    P1440,
    P1080,
    P720,
    P480,
    P360,
}

impl ResolutionTarget {
    pub const ALL: [ResolutionTarget; 7] = [
        ResolutionTarget::Source,
        ResolutionTarget::P2160,
        ResolutionTarget::P1440,
        ResolutionTarget::P1080,
        ResolutionTarget::P720,
        ResolutionTarget::P480,
        ResolutionTarget::P360,
    ];

    /// Fixed lookup table from symbolic label to explicit dimensions.
    /// `None` means no scale filter is added.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match self {
            ResolutionTarget::Source => None,
            ResolutionTarget::P2160 => Some((3840, 2160)),
            ResolutionTarget::P1440 => Some((2560, 1440)),
            ResolutionTarget::P1080 => Some((1920, 1080)),
            ResolutionTarget::P720 => Some((1280, 720)),
            ResolutionTarget::P480 => Some((854, 480)),
            ResolutionTarget::P360 => Some((640, 360)),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ResolutionTarget::Source => "source",
            ResolutionTarget::P2160 => "2160p (4K UHD)",
            ResolutionTarget::P1440 => "1440p (2K QHD)",
            ResolutionTarget::P1080 => "1080p (Full HD)",
            ResolutionTarget::P720 => "720p (HD)",
            ResolutionTarget::P480 => "480p (SD)",
            ResolutionTarget::P360 => "360p",
        }
    }
}

impl fmt::Display for ResolutionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ResolutionTarget {
    type Err = CompressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "source" | "original" => Ok(ResolutionTarget::Source),
            "2160p" | "4k" => Ok(ResolutionTarget::P2160),
            "1440p" => Ok(ResolutionTarget::P1440),
            "1080p" => Ok(ResolutionTarget::P1080),
            "720p" => Ok(ResolutionTarget::P720),
            "480p" => Ok(ResolutionTarget::P480),
            "360p" => Ok(ResolutionTarget::P360),
            other => Err(CompressError::InvalidOptions(format!(
                "unknown resolution '{other}' (expected source, 2160p, 1440p, 1080p, 720p, 480p, or 360p)"
            ))),
        }
    }
}

/// Frame rate target: keep the source rate, or convert to a fixed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameRateTarget {
    Source,
    Fixed(u32),
}

impl FrameRateTarget {
    /// The fixed set of allowed conversion targets.
    pub const ALLOWED: [u32; 5] = [24, 25, 30, 50, 60];
}

impl fmt::Display for FrameRateTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameRateTarget::Source => f.write_str("source"),
            FrameRateTarget::Fixed(n) => write!(f, "{n}"),
        }
    }
}

impl FromStr for FrameRateTarget {
    type Err = CompressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "source" || s == "original" {
            return Ok(FrameRateTarget::Source);
        }
        let n: u32 = s.parse().map_err(|_| {
            CompressError::InvalidOptions(format!("invalid frame rate '{s}'"))
        })?;
        if FrameRateTarget::ALLOWED.contains(&n) {
            Ok(FrameRateTarget::Fixed(n))
        } else {
            Err(CompressError::InvalidOptions(format!(
                "frame rate {n} not in allowed set {:?}",
                FrameRateTarget::ALLOWED
            )))
        }
    }
}

/// Output container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    Mp4,
    Mov,
    Mkv,
    Avi,
    Webm,
}

impl Container {
    pub const ALL: [Container; 5] = [
        Container::Mp4,
        Container::Mov,
        Container::Mkv,
        Container::Avi,
        Container::Webm,
    ];

    pub fn extension(&self) -> &'static str {
        match self {
            Container::Mp4 => "mp4",
            Container::Mov => "mov",
            Container::Mkv => "mkv",
            Container::Avi => "avi",
            Container::Webm => "webm",
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for Container {
    type Err = CompressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Container::ALL
            .iter()
            .find(|c| c.extension() == s)
            .copied()
            .ok_or_else(|| {
                CompressError::InvalidOptions(format!(
                    "unknown container '{s}' (expected mp4, mov, mkv, avi, or webm)"
                ))
            })
    }
}

/// One immutable set of user choices for a compression job.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompressionOptions {
    /// Constant-quality level, 0-51. Lower = higher fidelity, larger file.
    pub quality: u8,
    pub preset: Preset,
    /// Target bitrate in kbps. 0 means unset: the encoder picks a
    /// quality-driven rate from `quality` alone.
    pub bitrate_kbps: u32,
    pub resolution: ResolutionTarget,
    pub frame_rate: FrameRateTarget,
    pub container: Container,
}

/// Upper bound of the CRF scale.
pub const MAX_QUALITY: u8 = 51;

impl Default for CompressionOptions {
    fn default() -> Self {
        Self {
            quality: 23,
            preset: Preset::Medium,
            bitrate_kbps: 0,
            resolution: ResolutionTarget::Source,
            frame_rate: FrameRateTarget::Source,
            container: Container::Mp4,
        }
    }
}

impl CompressionOptions {
    /// Reject out-of-range values the type system cannot rule out.
    pub fn validate(&self) -> Result<(), CompressError> {
        if self.quality > MAX_QUALITY {
            return Err(CompressError::InvalidOptions(format!(
                "quality {} out of range (0-{MAX_QUALITY})",
                self.quality
            )));
        }
        Ok(())
    }

    /// Rough fidelity band for the quality level, for display only.
    pub fn quality_label(&self) -> &'static str {
        match self.quality {
            0..=17 => "High",
            18..=28 => "Medium",
            _ => "Low",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_roundtrip() {
        for p in Preset::ALL {
            assert_eq!(p.as_str().parse::<Preset>().unwrap(), p);
        }
    }

    #[test]
    fn test_preset_rejects_unknown() {
        assert!("turbo".parse::<Preset>().is_err());
        assert!("".parse::<Preset>().is_err());
        assert!("Medium".parse::<Preset>().is_err(), "labels are lowercase");
    }

    #[test]
    fn test_resolution_table() {
        assert_eq!(ResolutionTarget::Source.dimensions(), None);
        assert_eq!(ResolutionTarget::P1080.dimensions(), Some((1920, 1080)));
        assert_eq!(ResolutionTarget::P480.dimensions(), Some((854, 480)));
        assert_eq!("1080p".parse::<ResolutionTarget>().unwrap(), ResolutionTarget::P1080);
        assert!("540p".parse::<ResolutionTarget>().is_err());
    }

    #[test]
    fn test_frame_rate_fixed_set() {
        assert_eq!("source".parse::<FrameRateTarget>().unwrap(), FrameRateTarget::Source);
        assert_eq!("30".parse::<FrameRateTarget>().unwrap(), FrameRateTarget::Fixed(30));
        assert!("23".parse::<FrameRateTarget>().is_err(), "23 is not in the fixed set");
        assert!("abc".parse::<FrameRateTarget>().is_err());
    }

    #[test]
    fn test_container_parse() {
        assert_eq!("webm".parse::<Container>().unwrap(), Container::Webm);
        assert!("flv".parse::<Container>().is_err());
    }

    #[test]
    fn test_validate_quality_range() {
        let mut opts = CompressionOptions::default();
        opts.quality = 51;
        assert!(opts.validate().is_ok());

        opts.quality = 52;
        let err = opts.validate().unwrap_err();
        assert!(matches!(err, CompressError::InvalidOptions(_)));
    }

    #[test]
    fn test_quality_labels() {
        let mut opts = CompressionOptions::default();
        assert_eq!(opts.quality_label(), "Medium");
        opts.quality = 10;
        assert_eq!(opts.quality_label(), "High");
        opts.quality = 40;
        assert_eq!(opts.quality_label(), "Low");
    }
}
