use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// Encode preset chosen by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    /// Keep roughly the source bitrate
    #[default]
    Original,
    /// Fixed 1.2 Mb/s
    Medium,
    /// Fixed 600 kb/s, downscaled to 720p
    Low,
}

impl QualityTier {
    /// Fixed target bitrate in bits/sec, if the tier has one
    pub fn fixed_bitrate(self) -> Option<u64> {
        match self {
            QualityTier::Original => None,
            QualityTier::Medium => Some(1_200_000),
            QualityTier::Low => Some(600_000),
        }
    }

    /// Output frame size the tier forces, if any
    pub fn downscale(self) -> Option<(u32, u32)> {
        match self {
            QualityTier::Low => Some((1280, 720)),
            _ => None,
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QualityTier::Original => "original",
            QualityTier::Medium => "medium",
            QualityTier::Low => "low",
        };
        f.write_str(name)
    }
}

/// Hardware encoder vendor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HwAccel {
    /// Software encoding with libx264
    #[default]
    None,
    /// AMD AMF (h264_amf)
    Amd,
    /// NVIDIA NVENC (h264_nvenc)
    Nvidia,
}

impl HwAccel {
    pub fn is_hardware(self) -> bool {
        !matches!(self, HwAccel::None)
    }

    /// ffmpeg video encoder name
    pub fn video_codec(self) -> &'static str {
        match self {
            HwAccel::None => "libx264",
            HwAccel::Amd => "h264_amf",
            HwAccel::Nvidia => "h264_nvenc",
        }
    }
}

impl fmt::Display for HwAccel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HwAccel::None => "none",
            HwAccel::Amd => "amd",
            HwAccel::Nvidia => "nvidia",
        };
        f.write_str(name)
    }
}

/// Output container, used as the output file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Mp4,
    Mkv,
    Avi,
    Mov,
    Webm,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Mp4 => "mp4",
            OutputFormat::Mkv => "mkv",
            OutputFormat::Avi => "avi",
            OutputFormat::Mov => "mov",
            OutputFormat::Webm => "webm",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Everything the command synthesizer needs for one encode attempt.
///
/// `subtitle` points at the normalized (UTF-8) copy when the request comes
/// from the worker; dry runs pass the user's file directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeRequest {
    pub video: PathBuf,
    pub subtitle: PathBuf,
    pub output: PathBuf,
    pub quality: QualityTier,
    pub hw_accel: HwAccel,
    /// Probed source bitrate in bits/sec
    pub source_bitrate: Option<u64>,
}

/// Validated user choices for one encode, before probing and normalizing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeJob {
    pub id: Uuid,
    pub video: PathBuf,
    pub subtitle: PathBuf,
    pub output: PathBuf,
    pub quality: QualityTier,
    pub hw_accel: HwAccel,
}

impl EncodeJob {
    pub fn new(
        video: PathBuf,
        subtitle: PathBuf,
        output: PathBuf,
        quality: QualityTier,
        hw_accel: HwAccel,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            video,
            subtitle,
            output,
            quality,
            hw_accel,
        }
    }

    /// Build the synthesizer request for this job
    pub fn request(&self, subtitle: PathBuf, source_bitrate: Option<u64>) -> EncodeRequest {
        EncodeRequest {
            video: self.video.clone(),
            subtitle,
            output: self.output.clone(),
            quality: self.quality,
            hw_accel: self.hw_accel,
            source_bitrate,
        }
    }
}

/// Paths of the external tools
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}
