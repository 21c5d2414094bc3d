//! End-to-end tests for the `printlog` binary.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

fn data_path(dir: &TempDir) -> PathBuf {
    dir.path().join("data").join("jobs.json")
}

fn printlog(data: &Path) -> Command {
    let mut cmd = Command::cargo_bin("printlog").unwrap();
    cmd.env_remove("PRINTLOG_TEST_DATA")
        .env_remove("RUST_LOG")
        .arg("--data")
        .arg(data);
    cmd
}

fn run_json(data: &Path, args: &[&str]) -> Value {
    let output = printlog(data).arg("--json").args(args).output().unwrap();
    assert!(
        output.status.success(),
        "printlog {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

fn exit_code(data: &Path, args: &[&str]) -> i32 {
    let output = printlog(data).arg("--json").args(args).output().unwrap();
    output.status.code().unwrap()
}

#[test]
fn test_job_lifecycle_round_trip() {
    let dir = TempDir::new().unwrap();
    let data = data_path(&dir);
    let backup = dir.path().join("backup.json");

    let init = run_json(&data, &["init"]);
    assert_eq!(init["created"], true);

    let created = run_json(
        &data,
        &[
            "create",
            "--set",
            "material=PLA",
            "--set",
            "layer_height=0.2",
            "--photo",
            "uploads/benchy.jpg",
        ],
    );
    let id = created["id"].as_str().unwrap().to_string();
    assert!(id.starts_with("job_"));
    assert_eq!(created["material"], "PLA");
    assert_eq!(created["layer_height"], 0.2);
    assert_eq!(created["photo"], "uploads/benchy.jpg");

    let list = run_json(&data, &["list"]);
    assert_eq!(list["count"], 1);
    assert_eq!(list["items"][0]["id"], id.as_str());

    let updated = run_json(&data, &["update", &id, "--set", "material=PETG"]);
    assert_eq!(updated["id"], id.as_str());
    assert_eq!(updated["material"], "PETG");
    assert_eq!(updated["photo"], "uploads/benchy.jpg");
    assert!(updated["timestamp"].as_str().unwrap() > created["timestamp"].as_str().unwrap());

    let fetched = run_json(&data, &["get", &id]);
    assert_eq!(fetched, updated);

    let exported = run_json(&data, &["backup", "export", "--output", backup.to_str().unwrap()]);
    assert_eq!(exported["records"], 1);
    let backup_body: Value = serde_json::from_slice(&fs::read(&backup).unwrap()).unwrap();
    assert_eq!(backup_body[0]["material"], "PETG");

    let deleted = run_json(&data, &["delete", &id]);
    assert_eq!(deleted["deleted"], true);
    assert_eq!(exit_code(&data, &["delete", &id]), 3);
    assert_eq!(run_json(&data, &["list"])["count"], 0);

    let imported = run_json(&data, &["backup", "import", backup.to_str().unwrap(), "--yes"]);
    assert_eq!(imported["restored"], 1);
    assert_eq!(imported["replaced"], 0);
    assert_eq!(run_json(&data, &["get", &id]), updated);

    let status = run_json(&data, &["status"]);
    assert_eq!(status["exists"], true);
    assert_eq!(status["document"]["layout"], "envelope");
    assert_eq!(status["document"]["records"], 1);
    assert_eq!(status["document"]["checksum"]["state"], "verified");
    assert_eq!(status["newest"], updated["timestamp"]);
}

#[test]
fn test_missing_document_reads_as_empty() {
    let dir = TempDir::new().unwrap();
    let data = data_path(&dir);

    let list = run_json(&data, &["list"]);
    assert_eq!(list["count"], 0);
    assert!(!data.exists());
}

#[test]
fn test_init_refuses_existing_document() {
    let dir = TempDir::new().unwrap();
    let data = data_path(&dir);

    run_json(&data, &["init"]);
    run_json(&data, &["create", "--set", "material=PLA"]);

    assert_eq!(exit_code(&data, &["init"]), 2);
    assert_eq!(run_json(&data, &["list"])["count"], 1);

    let forced = run_json(&data, &["init", "--force"]);
    assert_eq!(forced["replaced"], 1);
    assert_eq!(run_json(&data, &["list"])["count"], 0);
}

#[test]
fn test_error_exit_codes() {
    let dir = TempDir::new().unwrap();
    let data = data_path(&dir);

    assert_eq!(exit_code(&data, &["get", "job_missing"]), 3);
    assert_eq!(exit_code(&data, &["update", "job_missing", "--set", "a=1"]), 3);
    assert_eq!(exit_code(&data, &["create", "--set", "material"]), 4);
    assert_eq!(exit_code(&data, &["create", "--fields", "[1, 2]"]), 4);
    assert_eq!(exit_code(&data, &["clear"]), 4);
}

#[test]
fn test_structured_error_on_stderr() {
    let dir = TempDir::new().unwrap();
    let data = data_path(&dir);

    let output = printlog(&data)
        .args(["--json", "get", "job_missing"])
        .output()
        .unwrap();
    let err: Value = serde_json::from_slice(&output.stderr).unwrap();
    assert_eq!(err["error"]["code"], "RECORD_NOT_FOUND");
    assert_eq!(err["error"]["exit_code"], 3);
}

#[test]
fn test_corrupt_document_is_reported_not_hidden() {
    let dir = TempDir::new().unwrap();
    let data = data_path(&dir);
    fs::create_dir_all(data.parent().unwrap()).unwrap();
    fs::write(&data, b"{not json").unwrap();

    assert_eq!(exit_code(&data, &["list"]), 2);
    assert_eq!(exit_code(&data, &["create", "--set", "material=PLA"]), 2);
    assert_eq!(fs::read(&data).unwrap(), b"{not json");

    let status = run_json(&data, &["status"]);
    assert!(status["error"].as_str().unwrap().contains("invalid JSON"));

    run_json(&data, &["clear", "--yes"]);
    assert_eq!(run_json(&data, &["list"])["count"], 0);
}

#[test]
fn test_import_rejects_bad_backup_without_writing() {
    let dir = TempDir::new().unwrap();
    let data = data_path(&dir);
    let backup = dir.path().join("bad.json");
    fs::write(&backup, r#"[{"id": "job_1"}, {"id": "job_1"}]"#).unwrap();

    run_json(&data, &["create", "--set", "material=PLA"]);
    let before = fs::read(&data).unwrap();

    assert_eq!(exit_code(&data, &["backup", "import", backup.to_str().unwrap(), "--yes"]), 4);
    assert_eq!(fs::read(&data).unwrap(), before);
}

#[test]
fn test_dry_run_clear_leaves_document() {
    let dir = TempDir::new().unwrap();
    let data = data_path(&dir);

    let created = run_json(&data, &["create", "--set", "material=PLA"]);
    let preview = run_json(&data, &["--dry-run", "clear", "--yes"]);
    assert_eq!(preview["dry_run"], true);
    assert_eq!(preview["ids"][0], created["id"]);
    assert_eq!(run_json(&data, &["list"])["count"], 1);
}

#[test]
fn test_silent_create_prints_id_only() {
    let dir = TempDir::new().unwrap();
    let data = data_path(&dir);

    let output = printlog(&data)
        .args(["--silent", "create", "--set", "material=PLA"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let id = String::from_utf8(output.stdout).unwrap();
    let id = id.trim();
    assert!(id.starts_with("job_"));
    assert_eq!(run_json(&data, &["get", id])["material"], "PLA");
}

#[test]
fn test_csv_list() {
    let dir = TempDir::new().unwrap();
    let data = data_path(&dir);

    run_json(&data, &["create", "--set", "material=PLA", "--set", "notes=stringing, minor"]);
    run_json(&data, &["create", "--photo", "uploads/a.jpg"]);

    let output = printlog(&data)
        .args(["--format", "csv", "list"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let csv = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "id,timestamp,material,notes,photo");
    assert!(lines[1].ends_with(",PLA,\"stringing, minor\","));
    assert!(lines[2].ends_with(",,,uploads/a.jpg"));
}
