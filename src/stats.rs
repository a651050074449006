// Size and time statistics for a finished encode

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputStats {
    /// Size of the source video
    pub input_bytes: u64,

    /// Size of the encoded output
    pub output_bytes: u64,

    /// Wall-clock encode time
    pub encode_time: Duration,
}

impl OutputStats {
    /// Read both file sizes from disk
    pub fn from_paths(input: &Path, output: &Path, encode_time: Duration) -> Result<Self> {
        let input_bytes = fs::metadata(input)
            .with_context(|| format!("Failed to stat {}", input.display()))?
            .len();
        let output_bytes = fs::metadata(output)
            .with_context(|| format!("Failed to stat {}", output.display()))?
            .len();

        Ok(Self {
            input_bytes,
            output_bytes,
            encode_time,
        })
    }

    /// Space saved relative to the input, in percent (negative when the output grew)
    pub fn compression_pct(&self) -> f64 {
        if self.input_bytes == 0 {
            0.0
        } else {
            (self.input_bytes as f64 - self.output_bytes as f64) / self.input_bytes as f64 * 100.0
        }
    }

    /// Multi-line summary shown after a successful encode
    pub fn summary(&self) -> String {
        format!(
            "Original size: {}\nOutput size: {}\nCompression: {:.1}%\nEncode time: {}",
            format_bytes(self.input_bytes),
            format_bytes(self.output_bytes),
            self.compression_pct(),
            format_duration(self.encode_time.as_secs_f64())
        )
    }
}

/// Format bytes as human-readable size
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Format duration in seconds as human-readable time
pub fn format_duration(seconds: f64) -> String {
    let total_secs = seconds as u64;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}
