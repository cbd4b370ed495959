use std::fs;
use std::process::{Command, Output};

use frameconfig::FrameConfig;
use tempfile::TempDir;

fn viewhost(config_dir: &std::path::Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_viewhost"))
        .env("VIEWHOST_CONFIG_DIR", config_dir)
        .env("RUST_LOG", "warn")
        .args(args)
        .output()
        .expect("failed to run viewhost")
}

#[test]
fn where_reports_the_env_directory() {
    let root = TempDir::new().unwrap();
    let config_dir = root.path().join("config");

    let output = viewhost(&config_dir, &["where"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(&config_dir.display().to_string()));
    assert!(stdout.contains("settings.toml (missing)"));
    assert!(config_dir.is_dir());
}

#[test]
fn backends_lists_null_last() {
    let root = TempDir::new().unwrap();
    let output = viewhost(root.path(), &["backends"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().last().map(str::trim), Some("null"));
}

#[test]
fn init_writes_loadable_defaults() {
    let root = TempDir::new().unwrap();

    let first = viewhost(root.path(), &["init"]);
    assert!(first.status.success());
    assert_eq!(
        FrameConfig::load(root.path()).unwrap(),
        FrameConfig::default()
    );

    let second = viewhost(root.path(), &["init"]);
    assert!(!second.status.success());

    let forced = viewhost(root.path(), &["init", "--force"]);
    assert!(forced.status.success());
}

#[test]
fn headless_null_run_completes() {
    let root = TempDir::new().unwrap();
    let output = viewhost(
        root.path(),
        &["--headless", "--backend", "null", "--frames", "3"],
    );
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn headless_simulated_xr_run_completes() {
    let root = TempDir::new().unwrap();
    let output = viewhost(
        root.path(),
        &[
            "--headless",
            "--backend",
            "null",
            "--xr",
            "--xr-runtime",
            "simulated",
            "--frames",
            "5",
        ],
    );
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn settings_file_drives_the_run() {
    let root = TempDir::new().unwrap();
    fs::write(
        root.path().join("settings.toml"),
        "version = 1\n\n[graphics]\nbackend = \"null\"\nwidth = 320\nheight = 240\n\n[xr]\nenabled = true\nruntime = \"simulated\"\n",
    )
    .unwrap();

    let output = viewhost(root.path(), &["--headless", "--frames", "2"]);
    assert!(output.status.success());
}

#[test]
fn invalid_settings_fail_the_run() {
    let root = TempDir::new().unwrap();
    fs::write(
        root.path().join("settings.toml"),
        "version = 1\n\n[graphics]\nmsaa = 3\n",
    )
    .unwrap();

    let output = viewhost(root.path(), &["--headless", "--backend", "null", "--frames", "1"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("graphics.msaa"), "stderr: {stderr}");
}

#[test]
fn zero_size_is_rejected_by_the_parser() {
    let root = TempDir::new().unwrap();
    let output = viewhost(root.path(), &["--headless", "--size", "0x10"]);
    assert!(!output.status.success());
}
