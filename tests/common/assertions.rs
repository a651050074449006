/// ffmpeg command assertion utilities
#[allow(dead_code)]
pub fn assert_cmd_contains(cmd: &str, fragment: &str) {
    assert!(
        cmd.contains(fragment),
        "Expected ffmpeg command to contain '{}' but it didn't.\nCommand: {}",
        fragment,
        cmd
    );
}

/// Check that a command string does NOT contain a fragment
#[allow(dead_code)]
pub fn assert_cmd_not_contains(cmd: &str, fragment: &str) {
    assert!(
        !cmd.contains(fragment),
        "Expected ffmpeg command to NOT contain '{}' but it did.\nCommand: {}",
        fragment,
        cmd
    );
}

/// Check that a flag is immediately followed by `value`
#[allow(dead_code)]
pub fn assert_cmd_has_flag_value(cmd: &str, flag: &str, value: &str) {
    let pattern = format!("{} {}", flag, value);
    assert!(
        cmd.contains(&pattern),
        "Expected ffmpeg command to contain '{} {}' but it didn't.\nCommand: {}",
        flag,
        value,
        cmd
    );
}

/// Check that `first` appears before `second`
#[allow(dead_code)]
pub fn assert_flag_order(cmd: &str, first: &str, second: &str) {
    let a = cmd.find(first);
    let b = cmd.find(second);
    assert!(
        matches!((a, b), (Some(a), Some(b)) if a < b),
        "Expected '{}' before '{}'.\nCommand: {}",
        first,
        second,
        cmd
    );
}
