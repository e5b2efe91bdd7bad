use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

use crate::cli::kbm_cmd;

const LEDGER: &str = r#"{
  "doc-1": {
    "destination_id": "dest-1",
    "source_title": "Lore",
    "destination_title": "Lore [en]",
    "source_updated_at": "2024-01-01T00:00:00Z",
    "translated_at": "2024-01-02T10:30:00Z"
  },
  "doc-2": {
    "destination_id": "dest-2",
    "source_title": "Characters",
    "destination_title": "Characters [en]",
    "source_updated_at": "2024-01-01T00:00:00Z",
    "translated_at": "2024-01-02T10:31:00Z"
  }
}"#;

fn seeded() -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(temp_dir.path().join("translation-ledger.json"), LEDGER).expect("Failed to write ledger");
    temp_dir
}

#[test]
fn test_list_empty_ledger() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    kbm_cmd(&temp_dir)
        .args(["ledger", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ledger is empty"));
}

#[test]
fn test_list_entries() {
    let temp_dir = seeded();
    kbm_cmd(&temp_dir)
        .args(["ledger", "list"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("doc-1 -> dest-1")
                .and(predicate::str::contains("Characters"))
                .and(predicate::str::contains("2 entries")),
        );
}

#[test]
fn test_ledger_path_from_environment() {
    let temp_dir = seeded();
    let moved = temp_dir.path().join("state").join("ledger.json");
    fs::create_dir_all(moved.parent().expect("parent")).expect("Failed to create dir");
    fs::rename(temp_dir.path().join("translation-ledger.json"), &moved).expect("Failed to move ledger");

    kbm_cmd(&temp_dir)
        .env("KBM_LEDGER_PATH", &moved)
        .args(["ledger", "show", "doc-2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Destination id: dest-2"));
}

#[test]
fn test_show_unknown_entry_fails() {
    let temp_dir = seeded();
    kbm_cmd(&temp_dir)
        .args(["ledger", "show", "doc-9"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No ledger entry for 'doc-9'"));
}

#[test]
fn test_remove_entry_persists() {
    let temp_dir = seeded();
    kbm_cmd(&temp_dir)
        .args(["ledger", "remove", "doc-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 'Lore'"));

    let content =
        fs::read_to_string(temp_dir.path().join("translation-ledger.json")).expect("Failed to read ledger");
    assert!(!content.contains("doc-1"));
    assert!(content.contains("doc-2"));
}

#[test]
fn test_corrupt_ledger_is_fatal() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(temp_dir.path().join("translation-ledger.json"), "{ not json").expect("Failed to write ledger");

    kbm_cmd(&temp_dir)
        .args(["ledger", "list"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("corrupt"));
}
