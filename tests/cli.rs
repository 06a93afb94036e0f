//! Binary-level tests for the `vault` command

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn vault(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("vault").unwrap();
    cmd.env("VAULT_DATA_DIR", dir.path())
        .env_remove("VAULT_LOG")
        .current_dir(dir.path());
    cmd
}

fn sign_in(dir: &TempDir, user: &str) {
    vault(dir)
        .args(["session", "sign-in", user])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Signed in as {}", user)));
}

#[test]
fn commands_fail_without_sign_in() {
    let dir = TempDir::new().unwrap();

    vault(&dir)
        .args(["credential", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("User not authenticated"));
}

#[test]
fn add_and_reveal_credential() {
    let dir = TempDir::new().unwrap();
    sign_in(&dir, "alice");

    vault(&dir)
        .args(["credential", "add", "OpenAI", "--api-key", "sk-cli-123", "-e", "dev@example.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Stored API key: OpenAI / dev@example.com"));

    vault(&dir)
        .args(["credential", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("OpenAI").and(predicate::str::contains("sk-cli-123").not()));

    vault(&dir)
        .args(["key", "list", "--reveal"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sk-cli-123"));

    let stored = std::fs::read_to_string(dir.path().join("data/api_keys.json")).unwrap();
    assert!(!stored.contains("sk-cli-123"));
}

#[test]
fn sign_out_orphans_secrets() {
    let dir = TempDir::new().unwrap();
    sign_in(&dir, "alice");

    vault(&dir)
        .args(["credential", "add", "Stripe", "--api-key", "sk-stripe"])
        .assert()
        .success();

    vault(&dir)
        .args(["session", "sign-out"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Session key discarded"));

    sign_in(&dir, "alice");
    vault(&dir)
        .args(["credential", "list", "--reveal"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[Decryption Error]"));
}

#[test]
fn export_then_import_into_another_account() {
    let dir = TempDir::new().unwrap();
    sign_in(&dir, "alice");

    vault(&dir)
        .args(["credential", "add", "OpenAI", "--api-key", "sk-1"])
        .assert()
        .success();
    vault(&dir)
        .args(["resource", "add-category", "Docs"])
        .assert()
        .success();
    vault(&dir)
        .args(["resource", "add", "Docs", "Rust book", "https://doc.rust-lang.org/book/"])
        .assert()
        .success();

    vault(&dir)
        .args(["data", "export", "backup.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 3 rows to backup.json"))
        .stderr(predicate::str::contains("Export Complete!"));

    let exported = std::fs::read_to_string(dir.path().join("backup.json")).unwrap();
    assert!(exported.contains("\"version\": \"1.0\""));
    assert!(exported.contains("\"apiKeys\""));

    sign_in(&dir, "bob");
    vault(&dir)
        .args(["data", "import", "backup.json", "--mode", "merge"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Import Complete!"));

    vault(&dir)
        .args(["data", "stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total").and(predicate::str::contains("3")));
}

#[test]
fn destructive_commands_need_force() {
    let dir = TempDir::new().unwrap();
    sign_in(&dir, "alice");

    vault(&dir)
        .args(["credential", "add", "OpenAI", "--api-key", "sk-1"])
        .assert()
        .success();

    vault(&dir)
        .args(["data", "clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Use --force to confirm"));

    vault(&dir)
        .args(["credential", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total: 1 keys"));

    vault(&dir)
        .args(["data", "wipe", "--force", "--backup", "wipe.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Backup written to wipe.json"));

    assert!(dir.path().join("wipe.json").exists());
    vault(&dir)
        .args(["credential", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No API keys found."));
}

#[test]
fn import_rejects_bad_documents() {
    let dir = TempDir::new().unwrap();
    sign_in(&dir, "alice");

    std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
    vault(&dir)
        .args(["data", "import", "broken.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid JSON file"));

    std::fs::write(
        dir.path().join("old.json"),
        r#"{"version":"0.9","exportedAt":"2024-01-01T00:00:00.000Z","userId":"x","data":{}}"#,
    )
    .unwrap();
    vault(&dir)
        .args(["data", "import", "old.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid import file format"));
}

#[test]
fn notes_are_saved_per_service() {
    let dir = TempDir::new().unwrap();
    sign_in(&dir, "alice");

    vault(&dir)
        .args(["note", "set", "Stripe", "--content", "Rotate monthly"])
        .assert()
        .success();
    vault(&dir)
        .args(["note", "set", "Stripe", "--content", "Rotate weekly"])
        .assert()
        .success();

    vault(&dir)
        .args(["note", "show", "Stripe"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rotate weekly"));
}
