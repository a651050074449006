use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use subburn::engine::{HwAccel, OutputFormat, QualityTier};

#[derive(Parser)]
#[command(name = "subburn")]
#[command(about = "Burn subtitles into a video with ffmpeg", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Use this config file instead of the default location
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct BurnArgs {
    /// Video to re-encode
    pub video: PathBuf,

    /// Subtitle file to burn in (.ass, .srt)
    pub subtitle: PathBuf,

    /// Output file name without extension (defaults to the video name plus a suffix)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Output directory (defaults to the video's directory)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output container
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Quality tier
    #[arg(short, long, value_enum)]
    pub quality: Option<QualityTier>,

    /// Hardware encoder
    #[arg(long, value_enum)]
    pub hw: Option<HwAccel>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Burn subtitles into a video
    Burn(BurnArgs),

    /// Show the ffmpeg command without executing it
    DryRun(BurnArgs),

    /// Probe a video file for duration and bitrate
    Probe {
        /// Path to the video file
        file: PathBuf,
    },

    /// Check if ffmpeg and ffprobe are installed
    CheckFfmpeg,

    /// Show config status and location, or create default config if missing
    InitConfig,
}

pub fn parse() -> Cli {
    Cli::parse()
}
