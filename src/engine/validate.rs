//! Input validation before an encode starts.
//!
//! Checks run in the order a user fills the form: video, subtitle, output
//! name, output directory. The first failure is reported.

use crate::engine::core::{EncodeJob, HwAccel, OutputFormat, QualityTier, ValidationError};
use std::path::{Path, PathBuf};

/// Raw user choices for one burn
#[derive(Debug, Clone)]
pub struct BurnOptions {
    pub video: PathBuf,
    pub subtitle: PathBuf,
    /// Output file name without extension; defaults to the video stem plus `name_suffix`
    pub output_name: Option<String>,
    /// Defaults to the video's directory
    pub output_dir: Option<PathBuf>,
    pub format: OutputFormat,
    pub quality: QualityTier,
    pub hw_accel: HwAccel,
    pub name_suffix: String,
}

/// Video stem plus suffix, e.g. `episode01` -> `episode01s`
pub fn default_output_name(video: &Path, suffix: &str) -> String {
    let stem = video
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}{}", stem, suffix)
}

/// Directory containing the video, or `.` for a bare file name
pub fn default_output_dir(video: &Path) -> PathBuf {
    match video.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Validate options and resolve output defaults into a job
pub fn validate(options: &BurnOptions) -> Result<EncodeJob, ValidationError> {
    if options.video.as_os_str().is_empty() || !options.video.is_file() {
        return Err(ValidationError::MissingVideo(options.video.clone()));
    }
    if options.subtitle.as_os_str().is_empty() || !options.subtitle.is_file() {
        return Err(ValidationError::MissingSubtitle(options.subtitle.clone()));
    }

    let name = match &options.output_name {
        Some(name) => name.trim().to_string(),
        None => default_output_name(&options.video, &options.name_suffix),
    };
    if name.is_empty() {
        return Err(ValidationError::EmptyOutputName);
    }

    let dir = options
        .output_dir
        .clone()
        .unwrap_or_else(|| default_output_dir(&options.video));
    if !dir.is_dir() {
        return Err(ValidationError::MissingOutputDir(dir));
    }

    let output = dir.join(format!("{}.{}", name, options.format.extension()));

    Ok(EncodeJob::new(
        options.video.clone(),
        options.subtitle.clone(),
        output,
        options.quality,
        options.hw_accel,
    ))
}
