use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;

const SAMPLE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/sample_payload.json");

#[test]
fn cli_shows_help() {
    let mut cmd = Command::cargo_bin("meteogram").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("render"))
        .stdout(predicate::str::contains("export"));
}

#[test]
fn render_from_file_writes_svg() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("wx.svg");
    let mut cmd = Command::cargo_bin("meteogram").unwrap();
    cmd.args(["render", "--input", SAMPLE, "--now", "2024-05-01T06:00"])
        .args(["--pan-hours", "-2", "--zoom", "2", "--width", "900", "--panel-height", "150"])
        .arg("--out")
        .arg(&out);
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Wrote 6 panels"));
    let svg = fs::read_to_string(&out).unwrap();
    assert!(svg.contains("Winds aloft"));
    assert!(svg.contains("height=\"900\""));
}

#[test]
fn config_file_sets_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("config.toml");
    fs::write(&cfg, "panel_width = 500\npanel_height = 100\nhorizon_hours = 12\n").unwrap();
    let out = dir.path().join("wx.svg");
    let mut cmd = Command::cargo_bin("meteogram").unwrap();
    cmd.args(["render", "--input", SAMPLE, "--now", "2024-05-01T06:00"])
        .arg("--config")
        .arg(&cfg)
        .arg("--out")
        .arg(&out);
    cmd.assert().success();
    let svg = fs::read_to_string(&out).unwrap();
    assert!(svg.contains("width=\"500\""));
    assert!(svg.contains("height=\"600\""));
}

#[test]
fn bad_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("config.toml");
    fs::write(&cfg, "zoom_modifier = \"meta\"\n").unwrap();
    let mut cmd = Command::cargo_bin("meteogram").unwrap();
    cmd.args(["render", "--input", SAMPLE, "--out", "unused.svg"])
        .arg("--config")
        .arg(&cfg);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("config"));
}

#[test]
fn bad_now_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("meteogram").unwrap();
    cmd.args(["render", "--input", SAMPLE, "--now", "yesterday"])
        .arg("--out")
        .arg(dir.path().join("wx.svg"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("invalid --now"));
}

#[test]
fn export_writes_csv_rows() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("wx.csv");
    let mut cmd = Command::cargo_bin("meteogram").unwrap();
    cmd.args(["export", "--input", SAMPLE]).arg("--out").arg(&out);
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("rows"));
    let csv = fs::read_to_string(&out).unwrap();
    assert!(csv.starts_with("panel,series,role,time,value"));
    assert!(csv.contains("winds,Wind layers,wind_layer,2024-05-01T03:00:00Z,3000"));
    // cloud layer codes travel along in their own column
    assert!(csv.lines().next().unwrap().ends_with(",cloud_base,symbol,visibility"));
    assert!(csv.contains(",BKN,"));
}

#[test]
fn missing_input_file_fails() {
    let mut cmd = Command::cargo_bin("meteogram").unwrap();
    cmd.args(["export", "--input", "/nonexistent/wx.json", "--out", "/tmp/never.csv"]);
    cmd.assert().failure().stderr(predicate::str::contains("/nonexistent/wx.json"));
}

// Live test (opt-in): cargo test --features online
#[cfg(feature = "online")]
#[test]
fn fetch_from_local_backend() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("wx.json");
    let mut cmd = Command::cargo_bin("meteogram").unwrap();
    cmd.args(["fetch", "--out"]).arg(&out);
    cmd.assert().success();
    assert!(fs::read_to_string(&out).unwrap().contains("temperature_data"));
}
