use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Variables that would leak settings from the developer's shell.
const SETTING_VARS: &[&str] = &[
    "KBM_API_URL",
    "KBM_API_TOKEN",
    "KBM_SOURCE_COLLECTION",
    "KBM_DESTINATION_COLLECTION",
    "KBM_TRANSLATION_API_KEY",
    "KBM_LEDGER_PATH",
    "KBM_MAX_SPENDING",
    "KBM_BATCH_SIZE",
    "KBM_DRY_RUN",
];

/// Command running in `dir` with no inherited settings.
#[allow(deprecated)]
pub fn kbm_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("kb-migrate").expect("Failed to find kb-migrate binary");
    cmd.current_dir(dir.path());
    for var in SETTING_VARS {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_help_lists_commands() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    kbm_cmd(&temp_dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("run")
                .and(predicate::str::contains("estimate"))
                .and(predicate::str::contains("tree"))
                .and(predicate::str::contains("ledger")),
        );
}

#[test]
fn test_run_requires_destination() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    kbm_cmd(&temp_dir)
        .args(["run", "--source", "src-collection"])
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "Missing required setting 'destination_collection'",
        ));
}

#[test]
fn test_run_requires_api_token() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    kbm_cmd(&temp_dir)
        .args(["run", "--source", "a", "--destination", "b"])
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("KBM_API_TOKEN"));
}

#[test]
fn test_settings_file_is_read() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(
        temp_dir.path().join("kb-migrate.toml"),
        "source_collection = \"a\"\ndestination_collection = \"b\"\n",
    )
    .expect("Failed to write settings");

    // Source and destination come from the file, so the token is what's missing.
    kbm_cmd(&temp_dir)
        .arg("run")
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("api_token"));
}

#[test]
fn test_explicit_config_must_exist() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    kbm_cmd(&temp_dir)
        .args(["--config", "nowhere.toml", "ledger", "list"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to load configuration"));
}

#[test]
fn test_unknown_command_is_rejected() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    kbm_cmd(&temp_dir).arg("translate-everything").assert().failure();
}
