//! Project loading and validation against real directory trees.

use assert_fs::prelude::*;
use brightly_core::FlagKind;
use brightly_project::{load_project_at, ProjectError};
use predicates::prelude::{predicate, Predicate};
use rstest::rstest;

const PROJECT_YAML: &str = "\
key: shop
name: Shop
environments:
  - key: staging
    name: Staging
  - key: production
";

fn project_root() -> assert_fs::TempDir {
    let root = assert_fs::TempDir::new().expect("tempdir");
    root.child("project.yaml").write_str(PROJECT_YAML).expect("project.yaml");
    root
}

// ---------------------------------------------------------------------------
// 1. Happy path
// ---------------------------------------------------------------------------

#[test]
fn loads_environments_and_flags() {
    let root = project_root();
    root.child("flags/dark-mode.yaml")
        .write_str("key: dark-mode\nkind: boolean\nenvironments:\n  staging: true\n  production: false\n")
        .expect("flag");
    root.child("flags/banner.yml")
        .write_str("key: banner\nkind: string\ndescription: Homepage banner\nenvironments:\n  staging: hello\n")
        .expect("flag");

    let project = load_project_at(root.path()).expect("load");
    assert_eq!(project.key, "shop");
    assert_eq!(project.name, "Shop");
    assert_eq!(project.environments[1].name, "production", "name defaults to key");

    let keys: Vec<_> = project.flags.iter().map(|f| f.key.as_str()).collect();
    assert_eq!(keys, ["banner", "dark-mode"], "flag files are read in sorted order");

    let archive = project.to_archive();
    assert_eq!(
        archive.envs["production"].data.flags["dark-mode"].kind,
        FlagKind::Boolean { variation: false }
    );
    assert!(!archive.envs["production"].data.flags.contains_key("banner"));
    assert_eq!(
        archive.envs["staging"].data.flags["banner"].kind,
        FlagKind::String {
            variation: "hello".into()
        }
    );
}

#[test]
fn project_without_flags_dir_has_no_flags() {
    let root = project_root();
    let project = load_project_at(root.path()).expect("validate");
    assert!(project.flags.is_empty());
    assert_eq!(project.to_archive().envs.len(), 2);
}

#[test]
fn non_yaml_files_are_ignored() {
    let root = project_root();
    root.child("flags/README.md").write_str("# notes").expect("readme");
    let project = load_project_at(root.path()).expect("load");
    assert!(project.flags.is_empty());
}

#[test]
fn validated_project_serializes_for_reports() {
    let root = project_root();
    root.child("flags/limit.yaml")
        .write_str("key: limit\nkind: number\nenvironments:\n  staging: 10\n")
        .expect("flag");
    let project = load_project_at(root.path()).expect("validate");
    let json = serde_json::to_value(&project).expect("json");
    assert_eq!(json["flags"][0]["values"]["staging"]["variation"], 10.0);
}

// ---------------------------------------------------------------------------
// 2. Validation failures
// ---------------------------------------------------------------------------

#[test]
fn missing_project_file_is_reported_with_path() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let err = load_project_at(root.path()).unwrap_err();
    assert!(matches!(err, ProjectError::ProjectFileNotFound { .. }), "got: {err}");
    assert!(predicate::str::contains("project.yaml").eval(&err.to_string()));
}

#[test]
fn duplicate_flag_keys_name_both_files() {
    let root = project_root();
    root.child("flags/a.yaml")
        .write_str("key: same\nkind: boolean\n")
        .expect("a");
    root.child("flags/b.yaml")
        .write_str("key: same\nkind: boolean\n")
        .expect("b");

    let err = load_project_at(root.path()).unwrap_err();
    let msg = err.to_string();
    assert!(matches!(err, ProjectError::DuplicateFlag { .. }), "got: {msg}");
    assert!(msg.contains("a.yaml") && msg.contains("b.yaml"), "got: {msg}");
}

#[test]
fn duplicate_environment_is_rejected() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    root.child("project.yaml")
        .write_str("key: shop\nenvironments:\n  - key: staging\n  - key: staging\n")
        .expect("project.yaml");
    let err = load_project_at(root.path()).unwrap_err();
    assert!(
        matches!(err, ProjectError::DuplicateEnvironment { ref key, .. } if key == "staging"),
        "got: {err}"
    );
}

#[rstest]
#[case::unknown_kind(
    "key: f\nkind: json\nenvironments:\n  staging: true\n",
    "unknown kind 'json'"
)]
#[case::unknown_kind_without_values("key: f\nkind: toggle\n", "unknown kind 'toggle'")]
#[case::path_like_flag_key("key: ../f\nkind: boolean\n", "flag key '../f'")]
#[case::wrong_value_type(
    "key: f\nkind: boolean\nenvironments:\n  staging: yes please\n",
    "must be a boolean value"
)]
#[case::undeclared_env(
    "key: f\nkind: boolean\nenvironments:\n  qa: true\n",
    "undeclared environment 'qa'"
)]
#[case::empty_key("key: ''\nkind: boolean\n", "flag key must not be empty")]
#[case::unknown_field("key: f\nkind: boolean\nrules: []\n", "failed to parse")]
#[case::malformed_yaml("key: [unclosed\n", "failed to parse")]
fn invalid_flag_files_are_rejected(#[case] contents: &str, #[case] expected: &str) {
    let root = project_root();
    root.child("flags/f.yaml").write_str(contents).expect("flag");

    let err = load_project_at(root.path()).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains(expected), "expected '{expected}' in: {msg}");
    assert!(msg.contains("f.yaml"), "error must name the file: {msg}");
}

#[rstest]
#[case::parent_dir("key: ../outside\nenvironments:\n  - key: staging\n", "project key '../outside'")]
#[case::absolute("key: /etc/brightly\nenvironments:\n  - key: staging\n", "project key '/etc/brightly'")]
#[case::hidden("key: .shop\nenvironments:\n  - key: staging\n", "project key '.shop'")]
#[case::env_with_slash("key: shop\nenvironments:\n  - key: prod/eu\n", "environment key 'prod/eu'")]
fn unsafe_keys_are_rejected(#[case] contents: &str, #[case] expected: &str) {
    let root = assert_fs::TempDir::new().expect("tempdir");
    root.child("project.yaml").write_str(contents).expect("project.yaml");

    let err = load_project_at(root.path()).unwrap_err();
    assert!(matches!(err, ProjectError::InvalidKey { .. }), "got: {err}");
    assert!(err.to_string().contains(expected), "got: {err}");
}
