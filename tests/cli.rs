use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn smartqr(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("smartqr").unwrap();
    cmd.env_remove("SMARTQR_CONFIG")
        .env_remove("RUST_LOG")
        .env("XDG_CONFIG_HOME", dir.path())
        .env("SMARTQR_HISTORY", dir.path().join("history.json"));
    cmd
}

#[test]
fn classify_prints_payload() {
    let dir = tempfile::tempdir().unwrap();
    smartqr(&dir)
        .args(["classify", "010-1234-5678"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tel:01012345678"))
        .stdout(predicate::str::contains("kind:        phone"));
}

#[test]
fn classify_samples_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let output = smartqr(&dir)
        .args(["classify", "--samples", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let kinds: Vec<&str> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["kind"].as_str().unwrap())
        .collect();
    assert_eq!(
        kinds,
        ["phone", "email", "url", "url", "sms", "wifi", "geo", "text"]
    );
}

#[test]
fn generate_writes_png_and_history() {
    let dir = tempfile::tempdir().unwrap();
    let png = dir.path().join("out").join("code.png");

    smartqr(&dir)
        .args(["generate", "naver.com", "--quiet", "--png"])
        .arg(&png)
        .assert()
        .success()
        .stdout(predicate::str::contains("saved"));

    let image = image::open(&png).unwrap();
    assert!(image.width() > 0);

    smartqr(&dir)
        .args(["history", "list", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://naver.com"))
        .stdout(predicate::str::contains("\"type\": \"url\""));
}

#[test]
fn generate_uses_default_file_names() {
    let dir = tempfile::tempdir().unwrap();
    smartqr(&dir)
        .current_dir(dir.path())
        .args(["generate", "naver.com", "--quiet", "--no-history", "--png", "--svg"])
        .assert()
        .success();

    assert!(dir.path().join("qrcode.png").exists());
    let svg = std::fs::read_to_string(dir.path().join("qrcode.svg")).unwrap();
    assert!(svg.contains("<svg"));
}

#[test]
fn generate_rejects_oversized_margin() {
    let dir = tempfile::tempdir().unwrap();
    smartqr(&dir)
        .args(["generate", "hello", "--quiet", "--margin", "4294967295"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("margin must be at most"));
}

#[test]
fn generate_prints_terminal_code() {
    let dir = tempfile::tempdir().unwrap();
    smartqr(&dir)
        .args(["generate", "hello", "--no-history"])
        .assert()
        .success()
        .stdout(predicate::str::contains("payload: hello"))
        .stdout(predicate::str::contains("█"));
    assert!(!dir.path().join("history.json").exists());
}

#[test]
fn generate_rejects_blank_text() {
    let dir = tempfile::tempdir().unwrap();
    smartqr(&dir)
        .args(["generate", "   ", "--quiet"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("empty"));
}

#[test]
fn history_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    smartqr(&dir)
        .args(["history", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("history is empty"));
}

#[test]
fn explicit_missing_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    smartqr(&dir)
        .args(["classify", "x", "--config"])
        .arg(dir.path().join("missing.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration"));
}
