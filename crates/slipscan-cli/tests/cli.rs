use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

const SLIP_TEXT: &str = "โอนเงินสำเร็จ\n5 มี.ค. 67 14:30\nจาก 123-4-56789-0\n1,234.50 บาท\n";

fn slipscan(config_dir: &tempfile::TempDir) -> Command {
    let config = config_dir.path().join("config.json");
    if !config.exists() {
        fs::write(&config, "{}").unwrap();
    }
    let mut cmd = Command::cargo_bin("slipscan").unwrap();
    cmd.arg("--config").arg(&config);
    cmd
}

#[test]
fn parse_reads_stdin() {
    let dir = tempfile::tempdir().unwrap();

    slipscan(&dir)
        .args(["parse", "-", "--now", "2024-06-01T08:00:00+07:00"])
        .write_stdin(SLIP_TEXT)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""slipId":"SCN-20240305-143000""#))
        .stdout(predicate::str::contains(r#""bankAccount":"123-4-56789-0""#))
        .stdout(predicate::str::contains(r#""paidAtSource":"thai""#));
}

#[test]
fn parse_falls_back_to_pinned_clock() {
    let dir = tempfile::tempdir().unwrap();

    slipscan(&dir)
        .args(["parse", "--format", "text", "--now", "2024-06-01T01:00:00Z"])
        .write_stdin("nothing useful")
        .assert()
        .success()
        .stdout(predicate::str::contains("Slip: SCN-20240601-080000"))
        .stdout(predicate::str::contains("Amount: -"));
}

#[test]
fn parse_rejects_bad_now() {
    let dir = tempfile::tempdir().unwrap();

    slipscan(&dir)
        .args(["parse", "--now", "soon"])
        .write_stdin(SLIP_TEXT)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid --now value"));
}

#[test]
fn batch_writes_outputs_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in");
    let output = dir.path().join("out");
    fs::create_dir_all(&input).unwrap();
    fs::write(input.join("a.txt"), SLIP_TEXT).unwrap();
    fs::write(input.join("b.txt"), "   ").unwrap();

    slipscan(&dir)
        .arg("batch")
        .arg(format!("{}/*.txt", input.display()))
        .arg("--output-dir")
        .arg(&output)
        .args(["--summary", "--continue-on-error"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 successful, 1 failed"));

    let parsed = fs::read_to_string(output.join("a.json")).unwrap();
    assert!(parsed.contains("SCN-20240305-143000"));
    let summary = fs::read_to_string(output.join("summary.csv")).unwrap();
    assert!(summary.contains("a.txt,success,SCN-20240305-143000"));
    assert!(summary.contains("b.txt,error"));
}

#[test]
fn config_get_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("config.json"),
        r#"{"extraction": {"year_mode": "corrected"}}"#,
    )
    .unwrap();

    slipscan(&dir)
        .args(["config", "get", "extraction.year_mode"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"corrected\""));
}

#[test]
fn process_requires_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("slip.jpg");
    fs::write(&image, [0xFF, 0xD8, 0xFF]).unwrap();

    slipscan(&dir)
        .env_remove("SLIPSCAN_VISION_API_KEY")
        .env_remove("SLIPSCAN_VISION_TOKEN")
        .arg("process")
        .arg(&image)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No OCR credentials configured"));
}
