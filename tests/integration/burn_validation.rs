// Validation of user choices into encode jobs

use std::fs;
use std::path::PathBuf;
use subburn::engine::validate::{BurnOptions, validate};
use subburn::engine::{HwAccel, OutputFormat, QualityTier, ValidationError, synthesize};
use tempfile::TempDir;

use crate::common::helpers::write_inputs;

fn options(video: PathBuf, subtitle: PathBuf) -> BurnOptions {
    BurnOptions {
        video,
        subtitle,
        output_name: None,
        output_dir: None,
        format: OutputFormat::Mp4,
        quality: QualityTier::Medium,
        hw_accel: HwAccel::None,
        name_suffix: "s".to_string(),
    }
}

#[test]
fn test_defaults_place_output_next_to_video() {
    let dir = TempDir::new().unwrap();
    let (video, subtitle) = write_inputs(dir.path());

    let job = validate(&options(video.clone(), subtitle.clone())).unwrap();
    assert_eq!(job.output, dir.path().join("episode01s.mp4"));
    assert_eq!(job.video, video);
    assert_eq!(job.subtitle, subtitle);
}

#[test]
fn test_explicit_name_dir_and_format() {
    let dir = TempDir::new().unwrap();
    let (video, subtitle) = write_inputs(dir.path());
    let out_dir = dir.path().join("out");
    fs::create_dir(&out_dir).unwrap();

    let mut opts = options(video, subtitle);
    opts.output_name = Some("  final cut  ".to_string());
    opts.output_dir = Some(out_dir.clone());
    opts.format = OutputFormat::Webm;

    let job = validate(&opts).unwrap();
    assert_eq!(job.output, out_dir.join("final cut.webm"));
}

#[test]
fn test_first_failure_is_reported() {
    let dir = TempDir::new().unwrap();
    let missing_video = dir.path().join("missing.mkv");
    let missing_sub = dir.path().join("missing.ass");

    // Both inputs missing: the video is checked first
    let err = validate(&options(missing_video.clone(), missing_sub.clone())).unwrap_err();
    assert_eq!(err, ValidationError::MissingVideo(missing_video));

    let (video, _) = write_inputs(dir.path());
    let err = validate(&options(video, missing_sub.clone())).unwrap_err();
    assert_eq!(err, ValidationError::MissingSubtitle(missing_sub));
}

#[test]
fn test_blank_name_and_missing_dir() {
    let dir = TempDir::new().unwrap();
    let (video, subtitle) = write_inputs(dir.path());

    let mut opts = options(video.clone(), subtitle.clone());
    opts.output_name = Some("   ".to_string());
    assert_eq!(validate(&opts).unwrap_err(), ValidationError::EmptyOutputName);

    let gone = dir.path().join("gone");
    let mut opts = options(video, subtitle);
    opts.output_dir = Some(gone.clone());
    assert_eq!(
        validate(&opts).unwrap_err(),
        ValidationError::MissingOutputDir(gone)
    );
}

#[test]
fn test_validated_job_feeds_synthesizer() {
    let dir = TempDir::new().unwrap();
    let (video, subtitle) = write_inputs(dir.path());
    let mut opts = options(video, subtitle.clone());
    opts.hw_accel = HwAccel::Amd;
    opts.format = OutputFormat::Mkv;

    let job = validate(&opts).unwrap();
    let cmd = synthesize(&job.request(subtitle, None));
    assert_eq!(cmd.value_of("-c:v"), Some("h264_amf"));
    assert_eq!(
        cmd.args().last().map(PathBuf::from),
        Some(dir.path().join("episode01s.mkv"))
    );
}
