use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;
use uuid::Uuid;

/// Input problems caught before any process starts
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("video file not found: {}", .0.display())]
    MissingVideo(PathBuf),

    #[error("subtitle file not found: {}", .0.display())]
    MissingSubtitle(PathBuf),

    #[error("output name is empty")]
    EmptyOutputName,

    #[error("output directory not found: {}", .0.display())]
    MissingOutputDir(PathBuf),
}

/// Why an encode attempt ended without an output file
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("{} not found; install ffmpeg and make sure it is in PATH", .program.display())]
    ToolNotFound { program: PathBuf },

    #[error("ffmpeg exited with {status}\n\nFFmpeg output:\n{stderr_tail}")]
    EncoderFailed {
        status: ExitStatus,
        stderr_tail: String,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Illegal move of the session state machine
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("an encode is already in flight ({0})")]
    Busy(Uuid),

    #[error("no encode is running")]
    NotRunning,

    #[error("encode {0} is already being cancelled")]
    AlreadyCancelling(Uuid),
}
