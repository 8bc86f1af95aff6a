use thiserror::Error;

use crate::orchestrator::Stage;
use crate::runner::{CommandOutput, CommandSpec};

/// Unified error type for release-cycle operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Required tool is missing: {tool} ({detail})")]
    DependencyMissing { tool: String, detail: String },

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Stage {stage} failed: {detail}")]
    Stage { stage: Stage, detail: String },

    #[error("Version parsing error: {0}")]
    Version(String),

    #[error("Command `{command}` failed: {detail}")]
    Command { command: String, detail: String },

    #[error("No primary remote branch found (expected origin/main or origin/master)")]
    NoRemoteBranch,

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Workspace error: {0}")]
    Workspace(String),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in release-cycle
pub type Result<T> = std::result::Result<T, ReleaseError>;

impl ReleaseError {
    /// Create a stage failure with context
    pub fn stage(stage: Stage, detail: impl Into<String>) -> Self {
        ReleaseError::Stage {
            stage,
            detail: detail.into(),
        }
    }

    /// Create a command failure from its captured output
    pub fn command(spec: &CommandSpec, output: &CommandOutput) -> Self {
        ReleaseError::Command {
            command: spec.command_line(),
            detail: output.failure_detail(),
        }
    }

    /// Create a version error with context
    pub fn version(msg: impl Into<String>) -> Self {
        ReleaseError::Version(msg.into())
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ReleaseError::Config(msg.into())
    }

    /// Create a manifest error with context
    pub fn manifest(msg: impl Into<String>) -> Self {
        ReleaseError::Manifest(msg.into())
    }

    /// Create an external service error with context
    pub fn external(msg: impl Into<String>) -> Self {
        ReleaseError::ExternalService(msg.into())
    }

    /// Errors that must terminate the process before (or instead of) running a cycle.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ReleaseError::DependencyMissing { .. }
                | ReleaseError::Authentication(_)
                | ReleaseError::Config(_)
                | ReleaseError::Workspace(_)
        )
    }

    /// The stage this error is attributed to, if any.
    pub fn stage_of(&self) -> Option<Stage> {
        match self {
            ReleaseError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReleaseError::config("missing section");
        assert_eq!(err.to_string(), "Configuration error: missing section");
    }

    #[test]
    fn test_stage_error_display_names_stage() {
        let err = ReleaseError::stage(Stage::Build, "exit code 101");
        assert_eq!(err.to_string(), "Stage build failed: exit code 101");
        assert_eq!(err.stage_of(), Some(Stage::Build));
    }

    #[test]
    fn test_command_error_carries_command_line() {
        let spec = CommandSpec::new("git").arg("push");
        let err = ReleaseError::command(&spec, &CommandOutput::failure(128, "rejected"));
        assert_eq!(err.to_string(), "Command `git push` failed: exit code 128: rejected");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ReleaseError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_fatal_classification() {
        let fatal = vec![
            ReleaseError::DependencyMissing {
                tool: "gh".to_string(),
                detail: "not found".to_string(),
            },
            ReleaseError::Authentication("no token".to_string()),
            ReleaseError::config("bad toml"),
            ReleaseError::Workspace("not a repo".to_string()),
        ];
        for err in fatal {
            assert!(err.is_fatal(), "{} should be fatal", err);
        }

        let recoverable = vec![
            ReleaseError::stage(Stage::Test, "tests failed"),
            ReleaseError::version("1.2"),
            ReleaseError::NoRemoteBranch,
            ReleaseError::external("connection refused"),
            ReleaseError::manifest("no [package]"),
        ];
        for err in recoverable {
            assert!(!err.is_fatal(), "{} should not be fatal", err);
        }
    }

    #[test]
    fn test_error_messages_are_descriptive() {
        let error_pairs = vec![
            (ReleaseError::config("x"), "Configuration error"),
            (ReleaseError::version("x"), "Version parsing error"),
            (ReleaseError::external("x"), "External service error"),
            (ReleaseError::manifest("x"), "Manifest error"),
            (ReleaseError::Authentication("x".into()), "Authentication failed"),
        ];

        for (err, expected_prefix) in error_pairs {
            let msg = err.to_string();
            assert!(
                msg.starts_with(expected_prefix),
                "Error message should start with '{}', but got '{}'",
                expected_prefix,
                msg
            );
        }
    }
}
