// Input probing using ffprobe

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::process::Command;

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    bit_rate: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    bit_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    #[serde(default)]
    format: FfprobeFormat,
}

/// What the encoder needs to know about the source
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MediaInfo {
    /// Container duration in seconds
    pub duration_s: Option<f64>,
    /// Video stream bitrate, or the container bitrate when the stream has none
    pub bitrate: Option<u64>,
}

/// Probe duration and bitrate of the first video stream in one ffprobe call
pub fn probe_media_info(ffprobe: &Path, input_path: &Path) -> Result<MediaInfo> {
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
            "-select_streams",
            "v:0",
        ])
        .arg(input_path)
        .output()
        .with_context(|| format!("Failed to execute {}", ffprobe.display()))?;

    if !output.status.success() {
        anyhow::bail!(
            "ffprobe failed for {}: {}",
            input_path.display(),
            String::from_utf8_lossy(&output.stderr)
        );
    }

    parse_media_info(&String::from_utf8_lossy(&output.stdout))
}

/// Probe a video file to get its duration in seconds
pub fn probe_duration(ffprobe: &Path, input_path: &Path) -> Result<f64> {
    probe_media_info(ffprobe, input_path)?
        .duration_s
        .context("No duration found in ffprobe output")
}

/// Probe a video file's bitrate in bits/sec. `Ok(None)` when ffprobe reports N/A.
pub fn probe_bitrate(ffprobe: &Path, input_path: &Path) -> Result<Option<u64>> {
    Ok(probe_media_info(ffprobe, input_path)?.bitrate)
}

/// Parse ffprobe's JSON output (`-show_format -show_streams`)
pub fn parse_media_info(json: &str) -> Result<MediaInfo> {
    let probe: FfprobeOutput =
        serde_json::from_str(json).context("Failed to parse ffprobe JSON output")?;

    let duration_s = probe
        .format
        .duration
        .as_deref()
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0);

    let stream_bitrate = probe
        .streams
        .first()
        .and_then(|s| parse_bitrate(s.bit_rate.as_deref()));
    let bitrate = stream_bitrate.or_else(|| parse_bitrate(probe.format.bit_rate.as_deref()));

    Ok(MediaInfo {
        duration_s,
        bitrate,
    })
}

fn parse_bitrate(value: Option<&str>) -> Option<u64> {
    let value = value?.trim();
    if value.is_empty() || value == "N/A" {
        return None;
    }
    value.parse::<u64>().ok().filter(|b| *b > 0)
}
