// Progress parsing over realistic ffmpeg output

use std::time::Duration;
use subburn::engine::{ProgressTracker, Remaining, observe};

/// Captured from an ffmpeg run with `-progress pipe:1`, stats and progress interleaved
const OUTPUT: &[&str] = &[
    "ffmpeg version 6.1.1 Copyright (c) 2000-2023 the FFmpeg developers",
    "Input #0, matroska,webm, from 'episode01.mkv':",
    "  Duration: 00:23:40.05, start: 0.000000, bitrate: 2841 kb/s",
    "frame=  240 fps=120 q=28.0 size=    1024kB time=00:00:10.01 bitrate= 838.1kbits/s speed=5.0x",
    "frame=240",
    "fps=120.00",
    "out_time_us=10010000",
    "out_time_ms=10010000",
    "out_time=00:00:10.010000",
    "progress=continue",
    "frame=  480 fps=120 q=28.0 size=    2048kB time=00:00:20.02 bitrate= 838.1kbits/s speed=5.0x",
    "out_time_ms=N/A",
    "progress=end",
];

#[test]
fn test_stream_yields_monotonic_samples() {
    let total = 23.0 * 60.0 + 40.05;
    let samples: Vec<_> = OUTPUT
        .iter()
        .filter_map(|line| observe(line, total, Duration::from_secs(2)))
        .collect();

    // stats line, out_time_us, out_time_ms, out_time, second stats line
    assert_eq!(samples.len(), 5);
    assert!((samples[0].processed_s - 10.01).abs() < 1e-9);
    assert!((samples[4].processed_s - 20.02).abs() < 1e-9);
    for pair in samples.windows(2) {
        assert!(pair[0].fraction <= pair[1].fraction);
    }
}

#[test]
fn test_banner_duration_is_not_progress() {
    assert!(observe(OUTPUT[2], 100.0, Duration::from_secs(1)).is_none());
}

#[test]
fn test_unparseable_out_time_stops_at_marker() {
    // `out_time_ms=N/A` is the first marker on its line, no fallback to time=
    assert!(observe("out_time_ms=N/A", 100.0, Duration::from_secs(1)).is_none());
}

#[test]
fn test_eta_extrapolates_from_elapsed() {
    let sample = observe(
        "frame=1 time=00:00:25.00 bitrate=N/A",
        100.0,
        Duration::from_secs(30),
    )
    .unwrap();

    assert_eq!(sample.fraction, Some(0.25));
    assert_eq!(sample.remaining, Remaining::Seconds(90.0));
    assert_eq!(sample.remaining.label(), "01:30");
    assert_eq!(sample.percent(), Some(25));
}

#[test]
fn test_overrun_clamps_to_done() {
    let sample = observe("out_time_ms=12000000", 10.0, Duration::from_secs(5)).unwrap();
    assert_eq!(sample.fraction, Some(1.0));
    assert_eq!(sample.remaining, Remaining::Finishing);
}

#[test]
fn test_tracker_without_duration() {
    let tracker = ProgressTracker::new(None);
    assert_eq!(tracker.total_duration_s(), None);

    let sample = tracker.observe("out_time_ms=3000000").unwrap();
    assert_eq!(sample.fraction, None);
    assert_eq!(sample.remaining, Remaining::DurationUnknown);
    assert_eq!(sample.remaining.label(), "duration unknown");
}

#[test]
fn test_tracker_early_sample_is_estimating() {
    let tracker = ProgressTracker::new(Some(3600.0));
    let sample = tracker.observe("out_time_ms=1000000").unwrap();
    assert_eq!(sample.remaining, Remaining::Estimating);
    assert_eq!(sample.remaining.label(), "estimating...");
}
