// tests/integration_test.rs
use std::fs;
use std::process::Command;

use git2::Repository;
use release_cycle::config::{parse_config, Config};
use release_cycle::domain::{BumpKind, VersionNumber};
use release_cycle::preflight;
use release_cycle::runner::MockRunner;
use release_cycle::ReleaseError;

const BIN: &str = env!("CARGO_BIN_EXE_release-cycle");

#[test]
fn test_release_cycle_help() {
    let output = Command::new(BIN)
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("release-cycle"));
    for flag in [
        "--daemon",
        "--interval",
        "--yes",
        "--use-ollama",
        "--config",
        "--project-dir",
        "--skip-release",
    ] {
        assert!(stdout.contains(flag), "help should mention {}", flag);
    }
}

#[test]
fn test_release_cycle_version() {
    let output = Command::new(BIN)
        .arg("--version")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_zero_interval_is_rejected() {
    let output = Command::new(BIN)
        .args(["--daemon", "--interval", "0"])
        .output()
        .expect("Failed to execute command");
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_outside_a_repository_exits_with_failure() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("release-cycle.toml"),
        "[vcs-auth]\ntoken = \"unused\"\n",
    )
    .unwrap();

    let output = Command::new(BIN)
        .arg("--yes")
        .arg("--project-dir")
        .arg(dir.path())
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Workspace error"));
}

#[test]
fn test_preflight_in_fresh_repository() {
    let dir = tempfile::tempdir().unwrap();
    Repository::init(dir.path()).unwrap();
    let config = parse_config("[vcs-auth]\ntoken = \"ghp_preflight\"\n").unwrap();
    let runner = MockRunner::new();

    let workspace = preflight::run(&runner, dir.path(), &config).unwrap();

    assert_eq!(workspace.project_dir, dir.path().canonicalize().unwrap());
    assert_eq!(
        runner.calls(),
        vec![
            "git --version",
            "cargo --version",
            "gh --version",
            "gh auth login --with-token",
        ]
    );
    assert!(runner
        .invocations()
        .iter()
        .all(|i| i.dir == workspace.project_dir));
}

#[test]
fn test_preflight_stops_at_missing_tool() {
    let dir = tempfile::tempdir().unwrap();
    Repository::init(dir.path()).unwrap();
    let config = parse_config("[vcs-auth]\ntoken = \"ghp_preflight\"\n").unwrap();
    let runner = MockRunner::new().on_spawn_error("cargo", "No such file or directory");

    let err = preflight::run(&runner, dir.path(), &config).unwrap_err();

    assert!(matches!(err, ReleaseError::DependencyMissing { .. }));
    assert!(!runner.was_called("gh auth"));
}

#[test]
fn test_preflight_rejects_bare_repository() {
    let dir = tempfile::tempdir().unwrap();
    Repository::init_bare(dir.path()).unwrap();
    let runner = MockRunner::new();

    let err = preflight::run(&runner, dir.path(), &Config::default()).unwrap_err();

    assert!(matches!(err, ReleaseError::Workspace(_)));
    assert!(runner.calls().is_empty());
}

#[test]
fn test_version_parsing_and_bumping() {
    let version = VersionNumber::parse("1.2.3").unwrap();
    assert_eq!(version.increment(BumpKind::Minor, "beta").unwrap().to_string(), "1.3.0-beta");
    assert_eq!(
        VersionNumber::parse("2.9.9")
            .unwrap()
            .increment(BumpKind::Patch, "beta")
            .unwrap()
            .to_string(),
        "2.9.10-beta"
    );
    assert!(VersionNumber::parse("1.2").is_err());
}
