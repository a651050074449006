// Command synthesis across quality tiers and encoders

use std::path::{Path, PathBuf};
use subburn::engine::{
    EncodeRequest, HwAccel, QualityTier, RateControl, escape_filter_path, rate_control, synthesize,
};

use crate::common::assertions::*;
use crate::common::helpers::*;

// ============================================================================
// Rate control
// ============================================================================

#[test]
fn test_medium_nvidia_uses_fixed_bitrate() {
    let cmd = cmd_to_string(&synthesize(&request(
        QualityTier::Medium,
        HwAccel::Nvidia,
        Some(8_000_000),
    )));

    assert_cmd_has_flag_value(&cmd, "-c:v", "h264_nvenc");
    assert_cmd_has_flag_value(&cmd, "-b:v", "1200000");
    assert_cmd_has_flag_value(&cmd, "-maxrate", "1440000");
    assert_cmd_has_flag_value(&cmd, "-bufsize", "2400000");
    assert_cmd_not_contains(&cmd, "scale=");
    assert_cmd_not_contains(&cmd, "-crf");
}

#[test]
fn test_low_tier_halves_medium_bitrate() {
    let cmd = cmd_to_string(&synthesize(&request(QualityTier::Low, HwAccel::None, None)));

    assert_cmd_has_flag_value(&cmd, "-b:v", "600000");
    assert_cmd_has_flag_value(&cmd, "-maxrate", "720000");
    assert_cmd_has_flag_value(&cmd, "-bufsize", "1200000");
    assert_cmd_has_flag_value(&cmd, "-preset", "medium");
    assert_cmd_contains(&cmd, ",scale=1280:720 ");
}

#[test]
fn test_original_tracks_source_bitrate() {
    let cmd = cmd_to_string(&synthesize(&request(
        QualityTier::Original,
        HwAccel::None,
        Some(5_000_000),
    )));

    assert_cmd_has_flag_value(&cmd, "-b:v", "4500000");
    assert_cmd_has_flag_value(&cmd, "-maxrate", "5400000");
    assert_cmd_has_flag_value(&cmd, "-bufsize", "9000000");
    assert_cmd_not_contains(&cmd, "scale=");
}

#[test]
fn test_original_low_source_clamps_to_floor() {
    let req = request(QualityTier::Original, HwAccel::Amd, Some(800_000));
    assert_eq!(rate_control(&req), RateControl::SourceMatched { target: 1_000_000 });

    let cmd = cmd_to_string(&synthesize(&req));
    assert_cmd_has_flag_value(&cmd, "-b:v", "1000000");
    assert_cmd_has_flag_value(&cmd, "-maxrate", "1200000");
    assert_cmd_has_flag_value(&cmd, "-bufsize", "2000000");
}

#[test]
fn test_unknown_bitrate_falls_back_per_encoder() {
    let software = cmd_to_string(&synthesize(&request(QualityTier::Original, HwAccel::None, None)));
    assert_cmd_has_flag_value(&software, "-crf", "20");
    assert_cmd_not_contains(&software, "-b:v");
    assert_cmd_not_contains(&software, "-rc ");

    let amd = cmd_to_string(&synthesize(&request(QualityTier::Original, HwAccel::Amd, None)));
    assert_cmd_contains(&amd, "-rc cqp -qp_i 20 -qp_p 22 -qp_b 24");
    assert_cmd_has_flag_value(&amd, "-quality", "speed");
    assert_cmd_not_contains(&amd, "-crf");

    let nvidia =
        cmd_to_string(&synthesize(&request(QualityTier::Original, HwAccel::Nvidia, None)));
    assert_cmd_contains(&nvidia, "-rc constqp -init_qpI 20 -init_qpP 22 -init_qpB 24");
    assert_cmd_has_flag_value(&nvidia, "-preset", "fast");
}

#[test]
fn test_zero_source_bitrate_is_unknown() {
    let req = request(QualityTier::Original, HwAccel::None, Some(0));
    assert_eq!(rate_control(&req), RateControl::QualityFallback);
}

// ============================================================================
// Layout
// ============================================================================

#[test]
fn test_fixed_prefix_and_suffix() {
    let cmd = synthesize(&request(QualityTier::Medium, HwAccel::Amd, None));
    let args = cmd.args();

    assert_eq!(args[0], "-i");
    assert_eq!(args[1], "/videos/episode01.mkv");
    assert_eq!(args[2], "-vf");
    assert_eq!(args[4], "-c:v");
    assert_eq!(args[5], "h264_amf");
    assert_eq!(&args[6..8], ["-c:a", "copy"]);

    let n = args.len();
    assert_eq!(
        &args[n - 4..],
        ["-progress", "pipe:1", "-y", "/videos/episode01s.mp4"]
    );
}

#[test]
fn test_rate_control_precedes_preset() {
    let cmd = cmd_to_string(&synthesize(&request(QualityTier::Low, HwAccel::Nvidia, None)));
    assert_flag_order(&cmd, "-c:a copy", "-b:v");
    assert_flag_order(&cmd, "-bufsize", "-preset fast");
    assert_flag_order(&cmd, "-preset fast", "-progress pipe:1");
}

#[test]
fn test_filter_escapes_subtitle_path() {
    let req = EncodeRequest {
        subtitle: PathBuf::from("/tmp/it's here.ass"),
        ..request(QualityTier::Low, HwAccel::None, None)
    };
    let cmd = synthesize(&req);
    assert_eq!(
        cmd.value_of("-vf"),
        Some(r"subtitles='/tmp/it'\''s here.ass',scale=1280:720")
    );
}

#[cfg(windows)]
#[test]
fn test_windows_path_uses_forward_slashes() {
    assert_eq!(
        escape_filter_path(Path::new(r"C:\Users\me\sub.ass")),
        r"C\:/Users/me/sub.ass"
    );
}

#[cfg(not(windows))]
#[test]
fn test_colon_is_escaped() {
    assert_eq!(escape_filter_path(Path::new("/mnt/c:/sub.ass")), r"/mnt/c\:/sub.ass");
}

#[test]
fn test_display_quotes_for_shell() {
    let req = EncodeRequest {
        video: PathBuf::from("/videos/my episode.mkv"),
        ..request(QualityTier::Medium, HwAccel::None, None)
    };
    let line = synthesize(&req).display_with(Path::new("/usr/bin/ffmpeg"));
    assert!(line.starts_with("/usr/bin/ffmpeg -i '/videos/my episode.mkv' -vf "), "{}", line);
}
