//! Progress tracking over ffmpeg's combined output stream.
//!
//! Two markers carry the processed media time: the `-progress` key
//! `out_time_ms=` / `out_time_us=` (microseconds, despite the name of the
//! first) and the stats line's `time=HH:MM:SS.frac`. The first marker found
//! decides the result for a line.

use std::time::{Duration, Instant};

/// Below this completion fraction no ETA is attempted
pub const ETA_EPSILON: f64 = 0.01;

/// Remaining-time estimate attached to a sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Remaining {
    /// Too early to extrapolate
    Estimating,
    /// Extrapolation says the encode is done or overdue
    Finishing,
    Seconds(f64),
    /// Total duration could not be probed
    DurationUnknown,
}

impl Remaining {
    /// `MM:SS` label, or a word when there is no number to show
    pub fn label(&self) -> String {
        match self {
            Remaining::Estimating => "estimating...".to_string(),
            Remaining::Finishing => "finishing...".to_string(),
            Remaining::DurationUnknown => "duration unknown".to_string(),
            Remaining::Seconds(s) => {
                let total = s.max(0.0) as u64;
                format!("{:02}:{:02}", total / 60, total % 60)
            }
        }
    }
}

/// Latest progress derived from one output line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSample {
    /// Media time processed so far, in seconds
    pub processed_s: f64,
    /// Completion in [0, 1]; None when the total duration is unknown
    pub fraction: Option<f64>,
    /// Wall-clock time since the encode started
    pub elapsed: Duration,
    pub remaining: Remaining,
}

impl ProgressSample {
    pub fn percent(&self) -> Option<u32> {
        self.fraction.map(|f| (f * 100.0) as u32)
    }
}

/// Which marker a processed time came from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressMarker {
    /// `out_time_ms=` / `out_time_us=` from `-progress`
    OutTime(f64),
    /// `time=HH:MM:SS.frac` from the stats line
    Timestamp(f64),
}

impl ProgressMarker {
    pub fn seconds(self) -> f64 {
        match self {
            ProgressMarker::OutTime(s) | ProgressMarker::Timestamp(s) => s,
        }
    }
}

/// Extract the processed time from a line, first matching marker wins.
/// A marker whose value does not parse yields None without trying the next.
pub fn parse_marker(line: &str) -> Option<ProgressMarker> {
    for key in ["out_time_ms=", "out_time_us="] {
        if let Some((_, value)) = line.rsplit_once(key) {
            let us = value.trim().parse::<i64>().ok()?;
            return Some(ProgressMarker::OutTime(us as f64 / 1_000_000.0));
        }
    }

    if line.contains("time=") {
        return line
            .match_indices("time=")
            .find_map(|(idx, key)| parse_timestamp(&line[idx + key.len()..]))
            .map(ProgressMarker::Timestamp);
    }

    None
}

/// Parse a leading `H+:M+:S+.F+` into seconds; trailing text is ignored
fn parse_timestamp(s: &str) -> Option<f64> {
    let (hours, rest) = take_digits(s)?;
    let rest = rest.strip_prefix(':')?;
    let (minutes, rest) = take_digits(rest)?;
    let rest = rest.strip_prefix(':')?;
    let (whole, rest) = take_digits(rest)?;
    let rest = rest.strip_prefix('.')?;
    let (frac, _) = take_digits(rest)?;

    let hours: f64 = hours.parse().ok()?;
    let minutes: f64 = minutes.parse().ok()?;
    let seconds: f64 = format!("{}.{}", whole, frac).parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

fn take_digits(s: &str) -> Option<(&str, &str)> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    Some(s.split_at(end))
}

/// Turn one output line into a sample.
///
/// `total_duration_s <= 0` (or non-finite) means the duration is unknown:
/// the sample then carries no fraction.
pub fn observe(line: &str, total_duration_s: f64, elapsed: Duration) -> Option<ProgressSample> {
    let processed_s = parse_marker(line)?.seconds();

    if !(total_duration_s.is_finite() && total_duration_s > 0.0) {
        return Some(ProgressSample {
            processed_s,
            fraction: None,
            elapsed,
            remaining: Remaining::DurationUnknown,
        });
    }

    let fraction = (processed_s / total_duration_s).clamp(0.0, 1.0);
    let remaining = if fraction > ETA_EPSILON {
        let left = elapsed.as_secs_f64() * (1.0 / fraction - 1.0);
        if left > 0.0 {
            Remaining::Seconds(left)
        } else {
            Remaining::Finishing
        }
    } else {
        Remaining::Estimating
    };

    Some(ProgressSample {
        processed_s,
        fraction: Some(fraction),
        elapsed,
        remaining,
    })
}

/// Holds the wall-clock origin and total duration for one encode
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    started_at: Instant,
    total_duration_s: f64,
}

impl ProgressTracker {
    /// Start tracking now. Pass None when the duration could not be probed.
    pub fn new(total_duration_s: Option<f64>) -> Self {
        Self {
            started_at: Instant::now(),
            total_duration_s: total_duration_s.unwrap_or(0.0),
        }
    }

    pub fn total_duration_s(&self) -> Option<f64> {
        (self.total_duration_s > 0.0).then_some(self.total_duration_s)
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn observe(&self, line: &str) -> Option<ProgressSample> {
        observe(line, self.total_duration_s, self.elapsed())
    }
}
