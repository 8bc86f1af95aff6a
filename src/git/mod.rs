//! Source control adapter
//!
//! [GitCli] wraps the `git` command line through a [CommandRunner]. Each
//! operation is a single synchronous invocation that hands back the captured
//! [CommandOutput]; deciding whether a non-zero exit matters is left to the
//! caller. The composite operations ([GitCli::resolve_primary_remote_branch],
//! [GitCli::diff_since_primary_branch], [GitCli::change_set_since]) turn
//! failures into [ReleaseError] values.
//!
//! [workspace] locates the repository with `git2` before any command runs.

pub mod workspace;

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::analyzer::{MANIFEST_PATH, SOURCE_DIR};
use crate::domain::{ChangeSet, PrimaryBranch};
use crate::error::{ReleaseError, Result};
use crate::runner::{CommandOutput, CommandRunner, CommandSpec};

/// Paths whose changes matter for commit messages and version bumps
pub const TRACKED_PATHS: [&str; 2] = [MANIFEST_PATH, SOURCE_DIR];

/// Pin the diff format so user config (colors, external drivers, prefix
/// settings) cannot change what [ChangeSet::from_diff] sees
pub const DIFF_FLAGS: [&str; 4] = [
    "--no-color",
    "--no-ext-diff",
    "--src-prefix=a/",
    "--dst-prefix=b/",
];

/// Outcome of diffing the working tree against the primary remote branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffSummary {
    /// The diff succeeded and was empty
    NoChanges,
    /// The diff succeeded; carries the raw diff text
    Changes(String),
}

/// `git` command-line adapter bound to a project directory
pub struct GitCli<'a, R: CommandRunner> {
    runner: &'a R,
    dir: PathBuf,
}

impl<'a, R: CommandRunner> GitCli<'a, R> {
    pub fn new(runner: &'a R, dir: impl AsRef<Path>) -> Self {
        GitCli {
            runner,
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn git<I, S>(&self, args: I) -> Result<(CommandSpec, CommandOutput)>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let spec = CommandSpec::new("git").args(args);
        let output = self.runner.run(&spec, &self.dir)?;
        Ok((spec, output))
    }

    fn git_output<I, S>(&self, args: I) -> Result<CommandOutput>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.git(args).map(|(_, output)| output)
    }

    /// Like [Self::git] but a non-zero exit becomes [ReleaseError::Command]
    fn git_checked<I, S>(&self, args: I) -> Result<CommandOutput>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (spec, output) = self.git(args)?;
        if output.is_success() {
            Ok(output)
        } else {
            Err(ReleaseError::command(&spec, &output))
        }
    }

    pub fn pull(&self) -> Result<CommandOutput> {
        self.git_output(["pull"])
    }

    pub fn fetch(&self) -> Result<CommandOutput> {
        self.git_output(["fetch"])
    }

    pub fn list_remote_branches(&self) -> Result<CommandOutput> {
        self.git_output(["branch", "-r"])
    }

    /// `git diff [DIFF_FLAGS] <base> -- <paths>`; `base` may be a ref or a range like `v1.0.0..HEAD`
    pub fn diff(&self, base: &str, paths: &[&str]) -> Result<CommandOutput> {
        self.git_output(diff_args(base, paths))
    }

    pub fn add(&self, paths: &[&str]) -> Result<CommandOutput> {
        let mut args = vec!["add".to_string()];
        args.extend(paths.iter().map(|p| p.to_string()));
        self.git_output(args)
    }

    pub fn commit(&self, message: &str) -> Result<CommandOutput> {
        self.git_output(["commit", "-m", message])
    }

    pub fn push(&self) -> Result<CommandOutput> {
        self.git_output(["push"])
    }

    /// Create an annotated tag
    pub fn tag(&self, name: &str, message: &str) -> Result<CommandOutput> {
        self.git_output(["tag", "-a", name, "-m", message])
    }

    pub fn push_tags(&self) -> Result<CommandOutput> {
        self.git_output(["push", "--tags"])
    }

    pub fn delete_tag(&self, name: &str) -> Result<CommandOutput> {
        self.git_output(["tag", "-d", name])
    }

    /// `git describe --tags --abbrev=0`; fails when the history has no tags
    pub fn latest_release_tag(&self) -> Result<CommandOutput> {
        self.git_output(["describe", "--tags", "--abbrev=0"])
    }

    /// Whether a tag with exactly this name exists locally
    pub fn tag_exists(&self, name: &str) -> Result<bool> {
        let output = self.git_checked(["tag", "--list", name])?;
        Ok(output.stdout.lines().any(|line| line.trim() == name))
    }

    /// Pick `origin/main`, else `origin/master`, from the remote branch listing
    pub fn resolve_primary_remote_branch(&self) -> Result<PrimaryBranch> {
        let output = require("git branch -r", self.list_remote_branches()?)?;
        PrimaryBranch::resolve(&output.stdout)
    }

    /// Diff the manifest and source directory against the primary remote branch
    ///
    /// Fetches first so the remote-tracking branch is current.
    pub fn diff_since_primary_branch(&self) -> Result<DiffSummary> {
        require("git fetch", self.fetch()?)?;
        let branch = self.resolve_primary_remote_branch()?;
        debug!(branch = %branch.name, "diffing against primary remote branch");

        let output = require("git diff", self.diff(&branch.name, &TRACKED_PATHS)?)?;

        let text = output.stdout.trim();
        if text.is_empty() {
            info!(branch = %branch.name, "no changes against primary remote branch");
            Ok(DiffSummary::NoChanges)
        } else {
            Ok(DiffSummary::Changes(text.to_string()))
        }
    }

    /// Files under the tracked paths changed between `base` and `HEAD`
    pub fn change_set_since(&self, base: &str) -> Result<ChangeSet> {
        let range = format!("{}..HEAD", base);
        let output = require("git diff", self.diff(&range, &TRACKED_PATHS)?)?;
        Ok(ChangeSet::from_diff(&output.stdout))
    }
}

/// Turn a non-zero exit from a composite step into [ReleaseError::Command]
fn require(command: &str, output: CommandOutput) -> Result<CommandOutput> {
    if output.is_success() {
        Ok(output)
    } else {
        Err(ReleaseError::Command {
            command: command.to_string(),
            detail: output.failure_detail(),
        })
    }
}

fn diff_args(base: &str, paths: &[&str]) -> Vec<String> {
    let mut args = vec!["diff".to_string()];
    args.extend(DIFF_FLAGS.iter().map(|f| f.to_string()));
    args.push(base.to_string());
    args.push("--".to_string());
    args.extend(paths.iter().map(|p| p.to_string()));
    args
}
