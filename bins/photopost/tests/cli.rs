//! End-to-end tests for the photopost binary

use assert_cmd::Command;
use image::{ImageOutputFormat, Rgb, RgbImage};
use predicates::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn photopost() -> Command {
    let mut cmd = Command::cargo_bin("photopost").unwrap();
    cmd.env_remove("PHOTOPOST_WP_PASSWORD").env("NO_COLOR", "1");
    cmd
}

/// Empty config so a developer's own photopost.toml never leaks in
fn empty_config(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("photopost.toml");
    std::fs::write(&path, "").unwrap();
    path
}

fn small_png(dir: &Path) -> PathBuf {
    let img = RgbImage::from_fn(320, 300, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 90]));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png).unwrap();
    let path = dir.join("harbour.png");
    std::fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn test_help_lists_commands() {
    photopost()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("inspect"))
        .stdout(predicate::str::contains("weather"))
        .stdout(predicate::str::contains("search"))
        .stdout(predicate::str::contains("publish"))
        .stdout(predicate::str::contains("categories"));
}

#[test]
fn test_inspect_small_png_uses_device_fix() {
    let dir = TempDir::new().unwrap();
    let config = empty_config(&dir);
    let photo = small_png(dir.path());

    let output = photopost()
        .arg("--config")
        .arg(&config)
        .args(["--json", "inspect"])
        .arg(&photo)
        .args(["--device-lat", "51", "--device-lon", "5", "--no-weather"])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["file"], "harbour.png");
    assert_eq!(report["transcode"]["decision"], "passthrough-small");
    assert!(report["transcode"]["report"].is_null());
    assert_eq!(report["location"]["status"], "resolved");
    assert_eq!(report["location"]["fix"]["source"], "device");
    assert_eq!(report["location"]["fix"]["latitude"], 51.0);
    assert!(report["weather"].is_null());
    assert!(report["preview"]["width"].as_u64().unwrap() <= 400);
}

#[test]
fn test_inspect_without_any_location_reports_both_reasons() {
    let dir = TempDir::new().unwrap();
    let config = empty_config(&dir);
    let photo = small_png(dir.path());

    let output = photopost()
        .arg("--config")
        .arg(&config)
        .args(["--json", "inspect"])
        .arg(&photo)
        .arg("--no-weather")
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["location"]["status"], "unresolved");
    assert!(report["location"]["reasons"]["metadata"].is_object());
    assert!(report["location"]["reasons"]["device"].is_object());
    assert!(report["location"]["message"].as_str().unwrap().contains("manually"));
}

#[test]
fn test_inspect_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    let config = empty_config(&dir);

    photopost()
        .arg("--config")
        .arg(&config)
        .arg("inspect")
        .arg(dir.path().join("nope.jpg"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_oversize_input_exits_with_code_4() {
    let dir = TempDir::new().unwrap();
    let config = empty_config(&dir);
    let photo = dir.path().join("huge.jpg");
    let mut bytes = vec![0u8; 60 * 1024 * 1024];
    bytes[..3].copy_from_slice(&[0xFF, 0xD8, 0xFF]);
    std::fs::write(&photo, bytes).unwrap();

    photopost()
        .arg("--config")
        .arg(&config)
        .arg("inspect")
        .arg(&photo)
        .arg("--no-weather")
        .assert()
        .code(4)
        .stderr(predicate::str::contains("OVERSIZE_INPUT").or(predicate::str::contains("too large")));
}

#[test]
fn test_weather_rejects_out_of_range_latitude() {
    let dir = TempDir::new().unwrap();
    let config = empty_config(&dir);

    photopost()
        .arg("--config")
        .arg(&config)
        .args(["weather", "--lat", "95", "--lon", "5"])
        .assert()
        .failure();
}

#[test]
fn test_blank_search_finds_nothing() {
    let dir = TempDir::new().unwrap();
    let config = empty_config(&dir);

    photopost()
        .arg("--config")
        .arg(&config)
        .args(["--json", "search", "   "])
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}

#[test]
fn test_publish_without_credentials_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    let config = empty_config(&dir);
    let photo = small_png(dir.path());

    photopost()
        .arg("--config")
        .arg(&config)
        .arg("publish")
        .arg(&photo)
        .args(["--title", "Harbour at dusk"])
        .assert()
        .code(3);
}

#[test]
fn test_publish_rejects_rating_out_of_range() {
    let dir = TempDir::new().unwrap();
    let photo = small_png(dir.path());

    photopost()
        .arg("publish")
        .arg(&photo)
        .args(["--title", "Harbour", "--rating", "9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("9"));
}

#[test]
fn test_missing_config_file_exits_with_code_3() {
    photopost()
        .args(["--config", "/definitely/not/here.toml", "search", "Utrecht"])
        .assert()
        .code(3);
}

#[test]
fn test_json_mode_prints_error_report() {
    photopost()
        .args(["--json", "--config", "/definitely/not/here.toml", "search", "Utrecht"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("\"code\": \"CONFIG_NOT_FOUND\""))
        .stdout(predicate::str::contains("E3001"));
}
