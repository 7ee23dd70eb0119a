//! CLI integration tests for Tether.
//!
//! The registry is played by a small shell script written into each test
//! project and wired in through `.tether/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const REGISTRY_SCRIPT: &str = r#"case "$1" in
  list)
    printf '%s\n' 'uuid   name' '------ ------' 'abc-1  mydb' 'def-2  logs'
    ;;
  create)
    printf 'Created %s\n\n[[resource_bindings]]\ndatabase_id = "id-%s"\n' "$2" "$2"
    ;;
  deploy)
    if grep -q 'id-newdb' wrangler.toml; then
      echo deployed
    else
      echo "Couldn't find a D1 DB with the name or binding 'newdb'" >&2
      exit 1
    fi
    ;;
esac
"#;

const TOOL_CONFIG: &str = r#"[registry]
command = "sh"
list_args = ["registry.sh", "list"]
create_args = ["registry.sh", "create"]

[deploy]
args = ["registry.sh", "deploy"]
"#;

/// Get the tether binary command, isolated from the user's environment.
fn tether(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tether").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env_remove("TETHER_REGISTRY_COMMAND");
    cmd
}

/// A project with a binding file and the scripted registry.
fn project(bindings: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("wrangler.toml");
    fs::write(&file, bindings).unwrap();
    fs::write(tmp.path().join("registry.sh"), REGISTRY_SCRIPT).unwrap();
    fs::create_dir(tmp.path().join(".tether")).unwrap();
    fs::write(tmp.path().join(".tether/config.toml"), TOOL_CONFIG).unwrap();
    (tmp, file)
}

fn backups(dir: &Path) -> usize {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_name()
                .to_string_lossy()
                .starts_with("wrangler.toml.backup.")
        })
        .count()
}

const VALID: &str = r#"name = "worker"

[[resource_bindings]]
binding = "DB"
database_name = "mydb"
database_id = "abc-1"
"#;

const MISMATCHED: &str = r#"[[resource_bindings]]
binding = "DB"
database_name = "mydb"
database_id = "wrong-id"

[[resource_bindings]]
binding = "ARCHIVE"
database_name = "archive"
"#;

// ============================================================================
// tether classify
// ============================================================================

#[test]
fn test_classify_resource_not_found() {
    let tmp = TempDir::new().unwrap();

    tether(tmp.path())
        .args([
            "classify",
            "Couldn't find a D1 DB with the name or binding 'mydb'",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("error: resource_not_found error"))
        .stdout(predicate::str::contains("resource: mydb"))
        .stdout(predicate::str::contains("tether recover"));
}

#[test]
fn test_classify_json_from_stdin() {
    let tmp = TempDir::new().unwrap();

    tether(tmp.path())
        .args(["classify", "--stdin", "--json"])
        .write_stdin("Unauthorized: token expired\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""category": "authentication""#))
        .stdout(predicate::str::contains(r#""can_recover": false"#));
}

#[test]
fn test_classify_unrelated_error() {
    let tmp = TempDir::new().unwrap();

    tether(tmp.path())
        .args(["classify", "TypeError: x is undefined"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not related to resource bindings"));
}

#[test]
fn test_classify_requires_message() {
    let tmp = TempDir::new().unwrap();
    tether(tmp.path()).arg("classify").assert().failure();
}

// ============================================================================
// tether bindings
// ============================================================================

#[test]
fn test_bindings_found_from_subdirectory() {
    let (tmp, _) = project(VALID);
    let nested = tmp.path().join("src");
    fs::create_dir(&nested).unwrap();

    tether(&nested)
        .args(["bindings", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""binding_name": "DB""#))
        .stdout(predicate::str::contains(r#""resource_id": "abc-1""#));
}

#[test]
fn test_bindings_explicit_config() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("app.toml"), MISMATCHED).unwrap();

    tether(tmp.path())
        .args(["bindings", "--config", "app.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ARCHIVE"))
        .stdout(predicate::str::contains("wrong-id"));
}

#[test]
fn test_bindings_without_config_file() {
    let tmp = TempDir::new().unwrap();

    tether(tmp.path())
        .arg("bindings")
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not find `wrangler.toml`"))
        .stderr(predicate::str::contains("--config"));
}

// ============================================================================
// tether completions
// ============================================================================

#[test]
fn test_completions_bash() {
    let tmp = TempDir::new().unwrap();

    tether(tmp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tether"));
}

// ============================================================================
// Commands that talk to the registry
// ============================================================================

#[cfg(unix)]
mod registry {
    use super::*;

    #[test]
    fn test_resources_lists_records() {
        let (tmp, _) = project(VALID);

        tether(tmp.path())
            .arg("resources")
            .assert()
            .success()
            .stdout(predicate::str::contains("abc-1"))
            .stdout(predicate::str::contains("logs"))
            .stdout(predicate::str::contains("uuid").not());
    }

    #[test]
    fn test_validate_valid_bindings() {
        let (tmp, _) = project(VALID);

        tether(tmp.path())
            .arg("validate")
            .assert()
            .success()
            .stderr(predicate::str::contains("all bindings match the registry"));
    }

    #[test]
    fn test_validate_reports_issues() {
        let (tmp, _) = project(MISMATCHED);

        tether(tmp.path())
            .arg("validate")
            .assert()
            .code(1)
            .stderr(predicate::str::contains(
                "DB: ID mismatch: expected wrong-id, found abc-1",
            ))
            .stderr(predicate::str::contains(
                "ARCHIVE: resource not found: archive",
            ));
    }

    #[test]
    fn test_validate_json() {
        let (tmp, _) = project(MISMATCHED);

        tether(tmp.path())
            .args(["validate", "--json"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains(r#""valid": false"#))
            .stdout(predicate::str::contains(r#""resource_name": "archive""#));
    }

    #[test]
    fn test_validate_with_missing_registry_command() {
        let (tmp, _) = project(VALID);

        tether(tmp.path())
            .args([
                "validate",
                "--json",
                "--registry-command",
                "tether-no-such-registry-command",
            ])
            .assert()
            .code(1)
            .stdout(predicate::str::contains(r#""binding_name": "configuration""#))
            .stdout(predicate::str::contains("not found in PATH"));
    }

    #[test]
    fn test_resources_with_missing_registry_command() {
        let (tmp, _) = project(VALID);

        tether(tmp.path())
            .arg("resources")
            .env("TETHER_REGISTRY_COMMAND", "tether-no-such-registry-command")
            .assert()
            .failure()
            .stderr(predicate::str::contains("not found in PATH"))
            .stderr(predicate::str::contains("Install the registry command"));
    }

    #[test]
    fn test_recover_creates_missing_database() {
        let (tmp, file) = project(VALID);

        tether(tmp.path())
            .args([
                "recover",
                "Couldn't find a D1 DB with the name or binding 'newdb'",
            ])
            .write_stdin("1\nNEWDB\n")
            .assert()
            .success()
            .stderr(predicate::str::contains("Created"));

        let written = fs::read_to_string(&file).unwrap();
        assert!(written.starts_with(VALID));
        assert!(written.contains(
            "[[resource_bindings]]\nbinding = \"NEWDB\"\ndatabase_name = \"newdb\"\ndatabase_id = \"id-newdb\"\n"
        ));
        assert_eq!(backups(tmp.path()), 1);
    }

    #[test]
    fn test_recover_cancel_leaves_file_untouched() {
        let (tmp, file) = project(VALID);

        tether(tmp.path())
            .args([
                "recover",
                "Couldn't find a D1 DB with the name or binding 'newdb'",
            ])
            .write_stdin("3\n")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("no changes made"));

        assert_eq!(fs::read_to_string(&file).unwrap(), VALID);
        assert_eq!(backups(tmp.path()), 0);
    }

    #[test]
    fn test_recover_from_stdin_never_updates_without_an_answer() {
        let (tmp, file) = project(MISMATCHED);

        tether(tmp.path())
            .args(["recover", "--stdin"])
            .write_stdin("Couldn't find a D1 DB with the name or binding 'mydb'\n")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("no changes made"));

        assert_eq!(fs::read_to_string(&file).unwrap(), MISMATCHED);
        assert_eq!(backups(tmp.path()), 0);
    }

    #[test]
    fn test_recover_not_recoverable() {
        let (tmp, file) = project(VALID);

        tether(tmp.path())
            .args(["recover", "Unauthorized: token expired"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("authentication error"))
            .stderr(predicate::str::contains("wrangler login"));

        assert_eq!(fs::read_to_string(&file).unwrap(), VALID);
    }

    #[test]
    fn test_deploy_recovers_and_retries() {
        let (tmp, file) = project(
            "[[resource_bindings]]\nbinding = \"DB\"\ndatabase_name = \"newdb\"\n",
        );

        tether(tmp.path())
            .arg("deploy")
            .write_stdin("1\n")
            .assert()
            .success()
            .stdout(predicate::str::contains("deployed"))
            .stderr(predicate::str::contains("deploy succeeded"));

        assert!(fs::read_to_string(&file)
            .unwrap()
            .contains("database_id = \"id-newdb\""));
    }

    #[test]
    fn test_deploy_no_retry() {
        let (tmp, _) = project(
            "[[resource_bindings]]\nbinding = \"DB\"\ndatabase_name = \"newdb\"\n",
        );

        tether(tmp.path())
            .args(["deploy", "--no-retry"])
            .write_stdin("1\n")
            .assert()
            .code(1)
            .stdout(predicate::str::contains("deployed").not())
            .stderr(predicate::str::contains("run the deploy again"));
    }
}
