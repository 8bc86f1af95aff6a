//! Preflight validation checks for early failure detection
//!
//! Run once at start-up, before the first cycle. Every failure here is fatal:
//! a missing tool or a rejected token would otherwise fail every cycle in the
//! same way.

use std::path::Path;

use tracing::{debug, info};

use crate::config::Config;
use crate::error::{ReleaseError, Result};
use crate::git::workspace::{self, Workspace};
use crate::github::GhCli;
use crate::runner::{CommandRunner, CommandSpec};

/// Tools every cycle shells out to
pub const REQUIRED_TOOLS: [&str; 3] = ["git", "cargo", "gh"];

/// Check each required tool answers `--version`.
pub fn check_dependencies<R: CommandRunner>(runner: &R, dir: &Path) -> Result<()> {
    for tool in REQUIRED_TOOLS {
        let spec = CommandSpec::new(tool).arg("--version");
        let output = runner
            .run(&spec, dir)
            .map_err(|e| ReleaseError::DependencyMissing {
                tool: tool.to_string(),
                detail: e.to_string(),
            })?;

        if !output.is_success() {
            return Err(ReleaseError::DependencyMissing {
                tool: tool.to_string(),
                detail: output.failure_detail(),
            });
        }
        let version = output.stdout.lines().next().unwrap_or("").trim();
        debug!(tool, version, "dependency available");
    }
    Ok(())
}

/// Log the hosting CLI in with the configured token.
pub fn authenticate<R: CommandRunner>(runner: &R, dir: &Path, config: &Config) -> Result<()> {
    let token = config.vcs_auth.require_token()?;
    GhCli::new(runner, dir).authenticate(token)
}

/// Workspace discovery, dependency check, then authentication.
///
/// # Returns
/// * `Ok(Workspace)` - Where the cycles will run
/// * `Err` - A fatal start-up error
pub fn run<R: CommandRunner>(runner: &R, project_dir: &Path, config: &Config) -> Result<Workspace> {
    let workspace = workspace::discover(project_dir)?;
    info!(
        project = %workspace.project_dir.display(),
        work_tree = %workspace.work_tree.display(),
        "workspace found"
    );

    check_dependencies(runner, &workspace.project_dir)?;
    authenticate(runner, &workspace.project_dir, config)?;
    Ok(workspace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VcsAuthConfig;
    use crate::runner::MockRunner;

    fn config_with_token(token: Option<&str>) -> Config {
        Config {
            vcs_auth: VcsAuthConfig {
                token: token.map(str::to_string),
            },
            ..Config::default()
        }
    }

    #[test]
    fn test_all_dependencies_present() {
        let runner = MockRunner::new()
            .on_success("git --version", "git version 2.43.0\n")
            .on_success("cargo --version", "cargo 1.78.0\n")
            .on_success("gh --version", "gh version 2.49.0\n");
        check_dependencies(&runner, Path::new("/project")).unwrap();
        assert_eq!(
            runner.calls(),
            vec!["git --version", "cargo --version", "gh --version"]
        );
    }

    #[test]
    fn test_missing_tool_is_fatal() {
        let runner = MockRunner::new().on_spawn_error("gh", "No such file or directory");
        let err = check_dependencies(&runner, Path::new("/project")).unwrap_err();
        match &err {
            ReleaseError::DependencyMissing { tool, .. } => assert_eq!(tool, "gh"),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(err.is_fatal());
    }

    #[test]
    fn test_failing_tool_stops_the_check() {
        let runner = MockRunner::new().on_failure("cargo --version", 127, "not found");
        assert!(check_dependencies(&runner, Path::new("/project")).is_err());
        assert!(!runner.was_called("gh --version"));
    }

    #[test]
    fn test_authenticate_without_token() {
        let runner = MockRunner::new();
        let err = authenticate(&runner, Path::new("/project"), &config_with_token(None))
            .unwrap_err();
        assert!(matches!(err, ReleaseError::Authentication(_)));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_authenticate_feeds_token() {
        let runner = MockRunner::new();
        authenticate(
            &runner,
            Path::new("/project"),
            &config_with_token(Some("ghp_abc")),
        )
        .unwrap();
        assert_eq!(runner.invocations()[0].stdin.as_deref(), Some("ghp_abc"));
    }

    #[test]
    fn test_run_rejects_non_repository() {
        let dir = tempfile::tempdir().unwrap();
        let runner = MockRunner::new();
        let err = run(&runner, dir.path(), &config_with_token(Some("t"))).unwrap_err();
        assert!(matches!(err, ReleaseError::Workspace(_)));
        assert!(runner.calls().is_empty());
    }
}
