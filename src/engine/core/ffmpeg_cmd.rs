use super::types::{EncodeRequest, HwAccel, QualityTier};
use std::fmt;
use std::path::Path;
use std::process::{Command, Stdio};

/// Bitrate floor applied when matching the source bitrate
pub const SOURCE_BITRATE_FLOOR: u64 = 1_000_000;

/// Constant rate factor used by libx264 when no bitrate is known
pub const FALLBACK_CRF: u32 = 20;

/// Fixed quantizers (I, P, B) used by hardware encoders when no bitrate is known
pub const FALLBACK_QP: (u32, u32, u32) = (20, 22, 24);

/// Rate-control branch chosen for a request. Exactly one applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateControl {
    Medium { target: u64 },
    Low { target: u64 },
    /// Original tier with a probed source bitrate
    SourceMatched { target: u64 },
    /// Original tier without a source bitrate: CRF or fixed QP
    QualityFallback,
}

impl RateControl {
    pub fn target(self) -> Option<u64> {
        match self {
            RateControl::Medium { target }
            | RateControl::Low { target }
            | RateControl::SourceMatched { target } => Some(target),
            RateControl::QualityFallback => None,
        }
    }
}

/// Pick the rate-control branch for a request
pub fn rate_control(request: &EncodeRequest) -> RateControl {
    match (request.quality.fixed_bitrate(), request.source_bitrate) {
        (Some(target), _) if request.quality == QualityTier::Low => RateControl::Low { target },
        (Some(target), _) => RateControl::Medium { target },
        (None, Some(source)) if source > 0 => RateControl::SourceMatched {
            target: (source / 10 * 9 + source % 10 * 9 / 10).max(SOURCE_BITRATE_FLOOR),
        },
        (None, _) => RateControl::QualityFallback,
    }
}

/// `maxrate` for a target bitrate (1.2x), saturating at `u64::MAX`
pub fn max_rate(target: u64) -> u64 {
    u64::try_from(u128::from(target) * 6 / 5).unwrap_or(u64::MAX)
}

/// `bufsize` for a target bitrate (2x), saturating at `u64::MAX`
pub fn buf_size(target: u64) -> u64 {
    target.saturating_mul(2)
}

/// Escape a path for use inside a quoted filter-graph argument.
///
/// `:` separates filter options, so it is backslash-escaped. A single quote
/// closes the quoting, so it is written as `'\''`.
pub fn escape_filter_path(path: &Path) -> String {
    let raw = path.to_string_lossy();
    let posix = if cfg!(windows) {
        raw.replace('\\', "/")
    } else {
        raw.into_owned()
    };
    posix.replace(':', r"\:").replace('\'', r"'\''")
}

/// Build the `-vf` filter chain for a request
pub fn video_filter(request: &EncodeRequest) -> String {
    let mut vf = format!("subtitles='{}'", escape_filter_path(&request.subtitle));
    if let Some((w, h)) = request.quality.downscale() {
        vf.push_str(&format!(",scale={}:{}", w, h));
    }
    vf
}

/// Ordered ffmpeg arguments for one encode (program name excluded)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeCommand {
    args: Vec<String>,
}

impl EncodeCommand {
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Value following `flag`, if the flag is present
    pub fn value_of(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    pub fn contains_flag(&self, flag: &str) -> bool {
        self.args.iter().any(|a| a == flag)
    }

    /// Process builder with piped output, ready to spawn
    pub fn command(&self, ffmpeg: &Path) -> Command {
        let mut cmd = Command::new(ffmpeg);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }

    /// Shell-quoted command line, for logs and dry runs
    pub fn display_with(&self, ffmpeg: &Path) -> String {
        let program = ffmpeg.to_string_lossy();
        std::iter::once(program.as_ref())
            .chain(self.args.iter().map(String::as_str))
            .map(|part| shlex::try_quote(part).map_or_else(|_| part.to_string(), |q| q.into_owned()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for EncodeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_with(Path::new("ffmpeg")))
    }
}

/// Map a request to its ffmpeg invocation. Pure and total.
pub fn synthesize(request: &EncodeRequest) -> EncodeCommand {
    let mut args: Vec<String> = Vec::with_capacity(32);
    let mut push = |items: &[&str]| args.extend(items.iter().map(|s| s.to_string()));

    push(&["-i", &request.video.to_string_lossy()]);
    push(&["-vf", &video_filter(request)]);
    push(&["-c:v", request.hw_accel.video_codec()]);
    push(&["-c:a", "copy"]);

    match rate_control(request).target() {
        Some(target) => push(&[
            "-b:v",
            &target.to_string(),
            "-maxrate",
            &max_rate(target).to_string(),
            "-bufsize",
            &buf_size(target).to_string(),
        ]),
        None => {
            let (qp_i, qp_p, qp_b) = FALLBACK_QP;
            match request.hw_accel {
                HwAccel::None => push(&["-crf", &FALLBACK_CRF.to_string()]),
                HwAccel::Amd => push(&[
                    "-rc",
                    "cqp",
                    "-qp_i",
                    &qp_i.to_string(),
                    "-qp_p",
                    &qp_p.to_string(),
                    "-qp_b",
                    &qp_b.to_string(),
                ]),
                HwAccel::Nvidia => push(&[
                    "-rc",
                    "constqp",
                    "-init_qpI",
                    &qp_i.to_string(),
                    "-init_qpP",
                    &qp_p.to_string(),
                    "-init_qpB",
                    &qp_b.to_string(),
                ]),
            }
        }
    }

    match request.hw_accel {
        HwAccel::None => push(&["-preset", "medium"]),
        HwAccel::Amd => push(&["-quality", "speed"]),
        HwAccel::Nvidia => push(&["-preset", "fast"]),
    }

    push(&["-progress", "pipe:1", "-y", &request.output.to_string_lossy()]);

    EncodeCommand { args }
}
