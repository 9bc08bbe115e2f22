// Parser for ffmpeg stderr progress lines
//
// A stats line looks like:
//   frame=  240 fps= 48 q=28.0 size=     512KiB time=00:00:10.00 bitrate= 419.4kbits/s speed=2.01x

/// One progress observation derived from a single engine log line.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    /// Percentage complete, clamped to 100. `None` when the input
    /// duration is unknown and progress is not computable.
    pub percent: Option<f64>,
    /// Output timestamp parsed from the line, in seconds.
    pub elapsed_s: f64,
    /// The raw engine line the event was derived from, unmodified.
    pub line: String,
}

/// Turns engine stderr lines into progress events against a known
/// input duration.
#[derive(Debug, Clone)]
pub struct ProgressParser {
    duration_s: f64,
}

impl ProgressParser {
    pub fn new(duration_s: f64) -> Self {
        Self { duration_s }
    }

    /// Parse one stderr line. Returns `None` for anything that is not a
    /// progress line (a progress line carries a frame count, a timestamp,
    /// and a bitrate marker). Negative timestamps, which ffmpeg emits when
    /// the PTS is unknown, are discarded rather than reported.
    pub fn parse_line(&self, line: &str) -> Option<ProgressEvent> {
        if !(line.contains("frame=") && line.contains("time=") && line.contains("bitrate=")) {
            return None;
        }

        let elapsed_s = extract_timestamp(line)?;
        if elapsed_s < 0.0 {
            return None;
        }
        let percent = if self.duration_s > 0.0 {
            Some((elapsed_s / self.duration_s * 100.0).min(100.0))
        } else {
            None
        };

        Some(ProgressEvent {
            percent,
            elapsed_s,
            line: line.to_string(),
        })
    }
}

/// Pull the `time=HH:MM:SS[.frac]` value out of a stats line.
fn extract_timestamp(line: &str) -> Option<f64> {
    let start = line.find("time=")? + "time=".len();
    let rest = &line[start..];
    let token = rest.split_whitespace().next()?;
    parse_timestamp(token)
}

/// Parse `HH:MM:SS[.frac]` into total seconds. A leading sign applies to
/// the whole timestamp, so `-00:00:05.00` comes back as `-5.0` even
/// though the hours field alone parses as negative zero.
pub fn parse_timestamp(ts: &str) -> Option<f64> {
    let (sign, ts) = match ts.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, ts),
    };
    let mut parts = ts.split(':');
    let hours: f64 = parts.next()?.parse().ok()?;
    let minutes: f64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || hours < 0.0 || minutes < 0.0 || seconds < 0.0 {
        return None;
    }
    Some(sign * (hours * 3600.0 + minutes * 60.0 + seconds))
}
