mod error;
mod ffmpeg_cmd;
mod ffmpeg_info;
mod progress;
mod session;
mod subtitle;
mod types;

pub use error::{EncodeError, TransitionError, ValidationError};
pub use ffmpeg_cmd::{
    EncodeCommand, FALLBACK_CRF, FALLBACK_QP, RateControl, SOURCE_BITRATE_FLOOR, buf_size,
    escape_filter_path, max_rate, rate_control, synthesize, video_filter,
};
pub use ffmpeg_info::{ffmpeg_version, ffprobe_version};
pub use progress::{
    ETA_EPSILON, ProgressMarker, ProgressSample, ProgressTracker, Remaining, observe, parse_marker,
};
pub use session::{Session, SessionState};
pub use subtitle::{
    Decoded, NormalizedSubtitle, candidate_encodings, decode_subtitle, normalize_subtitle,
    normalize_subtitle_in,
};
pub use types::{EncodeJob, EncodeRequest, HwAccel, OutputFormat, QualityTier, Toolchain};
