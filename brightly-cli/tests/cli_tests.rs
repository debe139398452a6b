//! Binary-level tests for `brightly validate` and `brightly reconcile`.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

const ENDPOINT: &str = "https://relay.example.com";

fn brightly_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("brightly"));
    for var in [
        "BRIGHTLY_YAML",
        "BRIGHTLY_ENDPOINT",
        "BRIGHTLY_S3_BUCKET",
        "BRIGHTLY_SECRETS_DIR",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn write_project(root: &Path, staging_value: bool) {
    fs::create_dir_all(root.join("flags")).expect("flags dir");
    fs::write(
        root.join("project.yaml"),
        "key: shop\nenvironments:\n  - key: staging\n    name: Staging\n",
    )
    .expect("project.yaml");
    fs::write(
        root.join("flags").join("dark-mode.yaml"),
        format!("key: dark-mode\nkind: boolean\nenvironments:\n  staging: {staging_value}\n"),
    )
    .expect("flag");
}

fn write_secrets(dir: &Path) {
    fs::write(dir.join("brightly-shop-staging-sdk-key"), "sdk-1").expect("sdk");
    fs::write(dir.join("brightly-shop-staging-mob-key"), "mob-1").expect("mob");
}

fn reconcile_cmd(project: &Path, bucket: &Path, secrets: &Path) -> Command {
    let mut cmd = brightly_cmd();
    cmd.arg("reconcile")
        .env("BRIGHTLY_YAML", project)
        .env("BRIGHTLY_ENDPOINT", ENDPOINT)
        .env("BRIGHTLY_S3_BUCKET", bucket)
        .env("BRIGHTLY_SECRETS_DIR", secrets);
    cmd
}

// ---------------------------------------------------------------------------
// 1. validate
// ---------------------------------------------------------------------------

#[test]
fn validate_reports_project_structure() {
    let project = TempDir::new().unwrap();
    write_project(project.path(), true);

    brightly_cmd()
        .args(["validate", "--project-root"])
        .arg(project.path())
        .assert()
        .success()
        .stdout(contains("'shop' is valid (1 environments, 1 flags)"))
        .stdout(contains("dark-mode [boolean]"));
}

#[test]
fn validate_json_reads_root_from_env() {
    let project = TempDir::new().unwrap();
    write_project(project.path(), false);

    brightly_cmd()
        .env("BRIGHTLY_YAML", project.path())
        .args(["validate", "--json"])
        .assert()
        .success()
        .stdout(contains("\"key\": \"shop\""));
}

#[test]
fn validate_failure_exits_non_zero_with_context() {
    let project = TempDir::new().unwrap();
    write_project(project.path(), true);
    fs::write(
        project.path().join("flags").join("bad.yaml"),
        "key: bad\nkind: percentage\n",
    )
    .unwrap();

    brightly_cmd()
        .args(["validate", "--project-root"])
        .arg(project.path())
        .assert()
        .failure()
        .stderr(contains("failed to validate project files"))
        .stderr(contains("unknown kind 'percentage'"));
}

// ---------------------------------------------------------------------------
// 2. reconcile
// ---------------------------------------------------------------------------

#[test]
fn reconcile_without_endpoint_fails_before_doing_anything() {
    let project = TempDir::new().unwrap();
    let bucket = TempDir::new().unwrap();
    write_project(project.path(), true);

    brightly_cmd()
        .arg("reconcile")
        .env("BRIGHTLY_YAML", project.path())
        .env("BRIGHTLY_S3_BUCKET", bucket.path())
        .env("BRIGHTLY_SECRETS_DIR", bucket.path())
        .assert()
        .failure()
        .stderr(contains("BRIGHTLY_ENDPOINT"));

    assert!(fs::read_dir(bucket.path()).unwrap().next().is_none());
}

#[test]
fn reconcile_publishes_then_tracks_changes() {
    let project = TempDir::new().unwrap();
    let bucket = TempDir::new().unwrap();
    let secrets = TempDir::new().unwrap();
    write_project(project.path(), false);
    write_secrets(secrets.path());

    reconcile_cmd(project.path(), bucket.path(), secrets.path())
        .assert()
        .success()
        .stdout(contains("first publish"))
        .stdout(contains("stored"));

    write_project(project.path(), true);
    reconcile_cmd(project.path(), bucket.path(), secrets.path())
        .assert()
        .success()
        .stdout(contains("2 ↑"));

    let endpoints: Vec<_> = fs::read_dir(bucket.path().join("shop"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(endpoints.len(), 1, "one archive per endpoint: {endpoints:?}");
    let slug = endpoints[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(slug.starts_with("https___relay_example_com-"), "got: {slug}");
    let archive_path = endpoints[0].join("archive.json");
    let archive: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(archive_path).unwrap()).unwrap();
    let staging = &archive["envs"]["staging"];
    assert_eq!(staging["metadata"]["data_id"], "2");
    assert_eq!(staging["metadata"]["sdk_key"], "sdk-1");
    assert_eq!(staging["data"]["flags"]["dark-mode"]["version"], 2);
    assert_eq!(staging["data"]["flags"]["dark-mode"]["variation"], true);
}

#[test]
fn dry_run_diff_shows_changes_and_writes_nothing() {
    let project = TempDir::new().unwrap();
    let bucket = TempDir::new().unwrap();
    let secrets = TempDir::new().unwrap();
    write_project(project.path(), true);
    write_secrets(secrets.path());

    reconcile_cmd(project.path(), bucket.path(), secrets.path())
        .args(["--dry-run", "--diff"])
        .assert()
        .success()
        .stdout(contains("[dry-run]"))
        .stdout(contains("+++ b/archive.json"))
        .stdout(contains("not stored"));

    assert!(fs::read_dir(bucket.path()).unwrap().next().is_none());
}

#[test]
fn missing_secret_fails_the_run() {
    let project = TempDir::new().unwrap();
    let bucket = TempDir::new().unwrap();
    let secrets = TempDir::new().unwrap();
    write_project(project.path(), true);

    reconcile_cmd(project.path(), bucket.path(), secrets.path())
        .assert()
        .failure()
        .stderr(contains("reconciliation failed"))
        .stderr(contains("brightly-shop-staging-sdk-key").or(contains("not found")));
}
