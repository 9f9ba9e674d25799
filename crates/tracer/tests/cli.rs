use std::fs;
use std::process::Command;

use tempfile::TempDir;

fn tracer(config_dir: &TempDir) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_tracer"));
    command
        .env("TRACER_CONFIG_DIR", config_dir.path())
        .env("RUST_LOG", "warn");
    command
}

#[test]
fn config_prints_defaults_without_a_settings_file() {
    let dir = TempDir::new().unwrap();
    let output = tracer(&dir)
        .arg("config")
        .output()
        .expect("failed to run tracer config");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("version = 1"));
    assert!(stdout.contains("samples_per_pixel = 10"));
    assert!(stdout.contains("samples_per_pass = 1"));
    assert!(stdout.contains("max_depth = 50"));
}

#[test]
fn config_reads_default_file_and_applies_flags() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("config.toml"),
        "version = 1\n[sampling]\nsamples_per_pixel = 40\nmax_depth = 8\n",
    )
    .unwrap();

    let output = tracer(&dir)
        .args(["config", "--samples-per-pass", "4", "--size", "320x180"])
        .output()
        .expect("failed to run tracer config");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("samples_per_pixel = 40"));
    assert!(stdout.contains("samples_per_pass = 4"));
    assert!(stdout.contains("max_depth = 8"));
    assert!(stdout.contains("width = 320"));
    assert!(stdout.contains("height = 180"));
}

#[test]
fn explicit_config_path_wins() {
    let dir = TempDir::new().unwrap();
    let custom = dir.path().join("custom.toml");
    fs::write(
        &custom,
        "version = 1\ntime_limit = \"45s\"\n[image]\nresolution = \"720p\"\n",
    )
    .unwrap();

    let output = tracer(&dir)
        .arg("config")
        .arg("--config")
        .arg(&custom)
        .output()
        .expect("failed to run tracer config");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("resolution = \"720p\""));
    assert!(stdout.contains("time_limit = \"45s\""));
}

#[test]
fn rejects_zero_samples() {
    let dir = TempDir::new().unwrap();
    let output = tracer(&dir)
        .args(["config", "--samples", "0"])
        .output()
        .expect("failed to run tracer config");

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("samples_per_pixel"));
}

#[test]
fn missing_config_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let output = tracer(&dir)
        .arg("config")
        .arg("--config")
        .arg(dir.path().join("absent.toml"))
        .output()
        .expect("failed to run tracer config");

    assert!(!output.status.success());
}
