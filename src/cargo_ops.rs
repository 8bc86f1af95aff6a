use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::BuildConfig;
use crate::error::{ReleaseError, Result};
use crate::runner::{CommandOutput, CommandRunner, CommandSpec};

/// Wrapper around the `cargo` CLI for building and testing the project.
///
/// Neither builds nor tests are bounded in time; a hung compiler or test blocks
/// the whole cycle.
pub struct CargoCli<'a, R: CommandRunner> {
    runner: &'a R,
    project_dir: PathBuf,
    build: BuildConfig,
}

impl<'a, R: CommandRunner> CargoCli<'a, R> {
    pub fn new(runner: &'a R, project_dir: impl AsRef<Path>, build: BuildConfig) -> Self {
        CargoCli {
            runner,
            project_dir: project_dir.as_ref().to_path_buf(),
            build,
        }
    }

    /// `cargo build --release --jobs <N>`
    pub fn build(&self) -> Result<CommandOutput> {
        let spec = CommandSpec::new("cargo").args([
            "build".to_string(),
            "--release".to_string(),
            "--jobs".to_string(),
            self.build.jobs.to_string(),
        ]);
        info!(command = %spec, "building project");
        self.runner.run(&spec, &self.project_dir)
    }

    /// `cargo test`
    pub fn test(&self) -> Result<CommandOutput> {
        let spec = CommandSpec::new("cargo").arg("test");
        info!(command = %spec, "running tests");
        self.runner.run(&spec, &self.project_dir)
    }

    /// Where a release build puts the executable for `project_name`
    pub fn artifact_path(&self, project_name: &str) -> PathBuf {
        self.project_dir
            .join("target")
            .join("release")
            .join(artifact_file_name(project_name))
    }

    /// Copy the release executable into `destination_dir`.
    ///
    /// # Returns
    /// * `Ok(PathBuf)` - Path of the copied artifact
    /// * `Err` - If the artifact does not exist or cannot be copied
    pub fn locate_and_copy_artifact(
        &self,
        project_name: &str,
        destination_dir: &Path,
    ) -> Result<PathBuf> {
        let source = self.artifact_path(project_name);
        if !source.is_file() {
            return Err(ReleaseError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Executable not found at {}", source.display()),
            )));
        }

        let destination = destination_dir.join(artifact_file_name(project_name));
        if same_file(&source, &destination) {
            return Ok(destination);
        }

        fs::copy(&source, &destination)?;
        info!(
            from = %source.display(),
            to = %destination.display(),
            "artifact copied"
        );
        Ok(destination)
    }
}

/// `<name>` plus the platform's executable suffix (`.exe` on Windows)
pub fn artifact_file_name(project_name: &str) -> String {
    format!("{}{}", project_name, std::env::consts::EXE_SUFFIX)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
