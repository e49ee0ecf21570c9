use std::process::Command;

use tempfile::TempDir;

#[test]
fn check_fails_for_missing_browser_executable() {
    let output = Command::new(env!("CARGO_BIN_EXE_pagecap"))
        .args(["check", "--chrome", "/definitely/not/a/browser"])
        .output()
        .expect("run pagecap");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.to_ascii_lowercase().contains("chrom"),
        "expected a browser hint on stderr, got: {stderr}"
    );
}

#[test]
fn run_without_targets_fails_with_guidance() {
    let output = Command::new(env!("CARGO_BIN_EXE_pagecap"))
        .args(["run", "--url", "https://example.com"])
        .output()
        .expect("run pagecap");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("--targets") || stderr.contains("--accordion"),
        "expected target guidance on stderr, got: {stderr}"
    );
}

#[test]
fn run_without_url_is_a_usage_error() {
    let status = Command::new(env!("CARGO_BIN_EXE_pagecap"))
        .args(["run", "--accordion", "A"])
        .status()
        .expect("run pagecap");

    // clap reports missing required arguments with exit code 2
    assert_eq!(status.code(), Some(2));
}

#[test]
fn run_rejects_malformed_targets_file() {
    let dir = TempDir::new().expect("tempdir");
    let targets = dir.path().join("targets.json");
    std::fs::write(&targets, "{ not json ]").expect("write targets");

    let output = Command::new(env!("CARGO_BIN_EXE_pagecap"))
        .args([
            "run",
            "--url",
            "https://example.com",
            "--targets",
            targets.to_str().unwrap(),
        ])
        .output()
        .expect("run pagecap");

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn help_lists_both_subcommands() {
    let output = Command::new(env!("CARGO_BIN_EXE_pagecap"))
        .arg("--help")
        .output()
        .expect("run pagecap");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("run"));
    assert!(stdout.contains("check"));
}
