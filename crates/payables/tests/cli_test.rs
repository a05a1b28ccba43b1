//! End-to-end tests running the command binaries.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Copy a fixture into a scratch directory so commands can write to it.
fn scratch_copy(dir: &Path, name: &str) -> PathBuf {
    let target = dir.join(name);
    std::fs::copy(fixture(name), &target).unwrap();
    target
}

fn run(bin: &str, args: &[&str]) -> Output {
    Command::new(bin).args(args).output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_check_reports_unbalanced_allocations() {
    let path = fixture("payables.json");
    let output = run(
        env!("CARGO_BIN_EXE_ap-check"),
        &["--format", "json", path.to_str().unwrap()],
    );
    assert_eq!(output.status.code(), Some(1));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["invoice_count"], 2);
    let codes: Vec<&str> = json["diagnostics"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, vec!["E1001", "E1002"]);
}

#[test]
fn test_check_missing_file_is_load_error() {
    let output = run(env!("CARGO_BIN_EXE_ap-check"), &["no-such-file.json"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("error[LOAD]"));
}

#[test]
fn test_settle_partial_prints_split() {
    let path = fixture("payables.json");
    let output = run(
        env!("CARGO_BIN_EXE_ap-settle"),
        &[
            path.to_str().unwrap(),
            "--invoice",
            "NF-1001",
            "--installment",
            "1",
            "--amount",
            "700,00",
            "--date",
            "2024-03-08",
            "--actor",
            "ana",
            "--at",
            "2024-03-08T10:00:00Z",
        ],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let installments = json["invoice"]["installments"].as_array().unwrap();
    assert_eq!(installments.len(), 2);
    assert_eq!(installments[1]["value"], "300.00");
    assert_eq!(installments[1]["split_from"], 1);
    assert_eq!(json["audit"][0]["action"], "Settlement");
    assert_eq!(json["audit"][0]["actor"], "ana");
}

#[test]
fn test_settle_over_amount_fails_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let path = scratch_copy(dir.path(), "payables.json");
    let before = std::fs::read_to_string(&path).unwrap();

    let output = run(
        env!("CARGO_BIN_EXE_ap-settle"),
        &[
            path.to_str().unwrap(),
            "--invoice",
            "NF-1001",
            "-n",
            "1",
            "--amount",
            "1200",
            "--actor",
            "ana",
            "--write",
        ],
    );
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("cannot settle installment 1"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn test_settle_then_reverse_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = scratch_copy(dir.path(), "payables.json");
    let file = path.to_str().unwrap();

    let settled = run(
        env!("CARGO_BIN_EXE_ap-settle"),
        &[file, "--invoice", "NF-1002", "-n", "1", "--amount", "250", "--actor", "ana", "-w"],
    );
    assert!(settled.status.success());
    assert!(stdout(&settled).contains("ana settlement installments"));
    let saved = std::fs::read_to_string(&path).unwrap();
    assert!(saved.contains("\"status\": \"Settled\""));

    let reversed = run(
        env!("CARGO_BIN_EXE_ap-reverse"),
        &[file, "--invoice", "NF-1002", "-n", "1", "--actor", "bia", "-w"],
    );
    assert!(reversed.status.success());
    assert!(stdout(&reversed).contains("bia reversal installments"));
    let saved = std::fs::read_to_string(&path).unwrap();
    assert!(saved.contains("\"status\": \"Pending\""));
}

#[test]
fn test_allocate_completes_last_entry() {
    let path = fixture("payables.json");
    let output = run(
        env!("CARGO_BIN_EXE_ap-allocate"),
        &[
            path.to_str().unwrap(),
            "--invoice",
            "NF-1002",
            "--kind",
            "category",
            "--index",
            "0",
            "--value",
            "150,00",
        ],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let categories = &json["invoice"]["categories"];
    assert_eq!(categories[0]["percentage"], "60.00");
    assert_eq!(categories[1]["percentage"], "40.00");
    assert_eq!(categories[1]["value"], "100.00");
}

#[test]
fn test_remit_writes_fixed_width_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.rem");
    let output = run(
        env!("CARGO_BIN_EXE_ap-remit"),
        &[
            fixture("payables.json").to_str().unwrap(),
            "--bank-code",
            "341",
            "--company-name",
            "Acme Holding",
            "--company-document",
            "12.345.678/0001-90",
            "--sequence",
            "7",
            "--date",
            "01/03/2024",
            "-o",
            out.to_str().unwrap(),
        ],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let content = std::fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = content.split_terminator("\r\n").collect();
    assert_eq!(lines.len(), 4);
    assert!(lines.iter().all(|l| l.len() == 240));
    assert!(lines[0].starts_with("0341"));
    assert!(lines[3].starts_with("9000004000000000000125000"));
}

#[test]
fn test_completions() {
    let output = run(
        env!("CARGO_BIN_EXE_ap-check"),
        &["--generate-completions", "bash"],
    );
    assert!(output.status.success());
    assert!(stdout(&output).contains("ap-check"));
}
