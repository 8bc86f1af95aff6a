//! Release-hosting collaborator backed by the GitHub CLI (`gh`)

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::domain::TagPattern;
use crate::error::{ReleaseError, Result};
use crate::runner::{CommandOutput, CommandRunner, CommandSpec};

/// `gh` command-line adapter bound to a project directory
pub struct GhCli<'a, R: CommandRunner> {
    runner: &'a R,
    dir: PathBuf,
}

impl<'a, R: CommandRunner> GhCli<'a, R> {
    pub fn new(runner: &'a R, dir: impl AsRef<Path>) -> Self {
        GhCli {
            runner,
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn gh<I, S>(&self, args: I) -> Result<(CommandSpec, CommandOutput)>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let spec = CommandSpec::new("gh").args(args);
        let output = self.runner.run(&spec, &self.dir)?;
        Ok((spec, output))
    }

    /// Log the CLI in with a token passed on stdin
    pub fn authenticate(&self, token: &str) -> Result<()> {
        info!("authenticating with GitHub using gh CLI");
        let spec = CommandSpec::new("gh")
            .args(["auth", "login", "--with-token"])
            .stdin(token);
        let output = self
            .runner
            .run(&spec, &self.dir)
            .map_err(|e| ReleaseError::Authentication(e.to_string()))?;

        if !output.is_success() {
            return Err(ReleaseError::Authentication(output.failure_detail()));
        }
        info!("authenticated with GitHub");
        Ok(())
    }

    /// Latest published release version, decoded from its tag with `pattern`.
    ///
    /// A tag that does not follow `pattern` is returned verbatim.
    ///
    /// # Returns
    /// * `Ok(Some(version))` - The version part of the latest release tag
    /// * `Ok(None)` - The repository has no releases yet
    /// * `Err` - The release listing could not be fetched
    pub fn latest_published_version(&self, pattern: &TagPattern) -> Result<Option<String>> {
        let (spec, listing) = self.gh(["release", "list"])?;
        if !listing.is_success() {
            if mentions_no_releases(&listing) {
                return Ok(None);
            }
            return Err(ReleaseError::command(&spec, &listing));
        }
        if listing.stdout.trim().is_empty() || mentions_no_releases(&listing) {
            return Ok(None);
        }

        let (spec, view) = self.gh(["release", "view", "--json", "tagName", "-q", ".tagName"])?;
        if !view.is_success() {
            return Err(ReleaseError::command(&spec, &view));
        }

        let tag = view.stdout.trim();
        if tag.is_empty() {
            warn!("latest release has an empty tag name");
            return Ok(None);
        }
        let version = pattern.version_part(tag).unwrap_or(tag);
        info!(version, "latest published release");
        Ok(Some(version.to_string()))
    }

    /// Create a hosted release for an already-pushed tag with generated notes
    pub fn create_release(&self, tag: &str) -> Result<CommandOutput> {
        let (spec, output) = self.gh(["release", "create", tag, "--generate-notes"])?;
        if output.is_success() {
            Ok(output)
        } else {
            Err(ReleaseError::command(&spec, &output))
        }
    }
}

fn mentions_no_releases(output: &CommandOutput) -> bool {
    let needle = "no releases found";
    output.stdout.to_lowercase().contains(needle) || output.stderr.to_lowercase().contains(needle)
}
