//! Release orchestration state machine
//!
//! One cycle walks the stages in order:
//!
//! 1. Pull latest changes
//! 2. Build in release mode
//! 3. Copy the built executable next to the invocation
//! 4. Run the test suite
//! 5. Generate a commit message
//! 6. Commit and push
//! 7. Optionally cut a release (see [release])
//!
//! Every stage is gated by the [ConfirmationPolicy]; a declined stage is
//! skipped and the cycle moves on. The first failing stage ends the cycle and
//! is reported in the returned [CycleResult]; nothing here panics or exits.

pub mod release;

pub use release::ReleaseDecision;

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::analyzer::{ChangeClassifier, MANIFEST_PATH};
use crate::cargo_ops::CargoCli;
use crate::commit_message::{
    CommitMessageGenerator, DEFAULT_COMMIT_MESSAGE, NO_CHANGES_COMMIT_MESSAGE,
};
use crate::config::{BuildConfig, ClassifierConfig, Config, ReleaseConfig};
use crate::error::{ReleaseError, Result};
use crate::git::{DiffSummary, GitCli};
use crate::github::GhCli;
use crate::manifest;
use crate::runner::{CommandOutput, CommandRunner};
use crate::scheduler::CycleRunner;
use crate::ui::ConfirmationPolicy;
use crate::warning::ReleaseWarning;

/// Confirmation asked once before the release sub-flow starts
pub const RELEASE_PROMPT: &str = "Create a release for this build?";

/// A step of the cycle, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    PullLatest,
    Build,
    CopyArtifact,
    Test,
    GenerateCommitMessage,
    CommitAndPush,
    DetermineVersion,
    UpdateManifest,
    TagRelease,
    PushTag,
    PublishRelease,
}

impl Stage {
    /// Stable kebab-case name used in logs and error messages
    pub fn name(&self) -> &'static str {
        match self {
            Stage::PullLatest => "pull-latest",
            Stage::Build => "build",
            Stage::CopyArtifact => "copy-artifact",
            Stage::Test => "test",
            Stage::GenerateCommitMessage => "generate-commit-message",
            Stage::CommitAndPush => "commit-and-push",
            Stage::DetermineVersion => "determine-version",
            Stage::UpdateManifest => "update-manifest",
            Stage::TagRelease => "tag-release",
            Stage::PushTag => "push-tag",
            Stage::PublishRelease => "publish-release",
        }
    }

    /// Question put to the confirmation policy before the stage runs
    pub fn prompt(&self) -> &'static str {
        match self {
            Stage::PullLatest => "Pull latest changes?",
            Stage::Build => "Build the project in release mode?",
            Stage::CopyArtifact => "Copy the built executable?",
            Stage::Test => "Run the test suite?",
            Stage::GenerateCommitMessage => "Generate a commit message from the diff?",
            Stage::CommitAndPush => "Commit and push all changes?",
            Stage::DetermineVersion => "Determine the next release version?",
            Stage::UpdateManifest => "Write the new version to Cargo.toml and commit it?",
            Stage::TagRelease => "Create the release tag?",
            Stage::PushTag => "Push the release tag?",
            Stage::PublishRelease => "Publish a release with generated notes?",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CycleResult {
    /// Last stage entered (the failing one when `success` is false)
    pub stage_reached: Stage,
    pub success: bool,
    pub error_detail: Option<String>,
    /// Set when the release sub-flow got as far as deciding a version
    pub release: Option<ReleaseDecision>,
    /// Stages declined by the confirmation policy
    pub skipped: Vec<Stage>,
    pub warnings: Vec<ReleaseWarning>,
}

impl CycleResult {
    /// A failed result with no other context
    pub fn failed(stage: Stage, detail: impl Into<String>) -> Self {
        CycleResult {
            stage_reached: stage,
            success: false,
            error_detail: Some(detail.into()),
            release: None,
            skipped: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// Immutable inputs of the orchestrator
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    /// Directory holding `Cargo.toml`; every command runs here
    pub project_dir: PathBuf,
    /// Where the built executable is copied
    pub artifact_dir: PathBuf,
    pub build: BuildConfig,
    pub release: ReleaseConfig,
    pub classifier: ClassifierConfig,
    pub skip_release: bool,
}

impl PipelineSettings {
    pub fn new(project_dir: impl AsRef<Path>, artifact_dir: impl AsRef<Path>, config: &Config) -> Self {
        PipelineSettings {
            project_dir: project_dir.as_ref().to_path_buf(),
            artifact_dir: artifact_dir.as_ref().to_path_buf(),
            build: config.build.clone(),
            release: config.release.clone(),
            classifier: config.classifier.clone(),
            skip_release: false,
        }
    }

    pub fn skip_release(mut self, skip: bool) -> Self {
        self.skip_release = skip;
        self
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.project_dir.join(MANIFEST_PATH)
    }
}

/// Mutable bookkeeping for the cycle in progress
struct CycleState {
    stage: Stage,
    skipped: Vec<Stage>,
    warnings: Vec<ReleaseWarning>,
    release: Option<ReleaseDecision>,
}

impl CycleState {
    fn new() -> Self {
        CycleState {
            stage: Stage::PullLatest,
            skipped: Vec::new(),
            warnings: Vec::new(),
            release: None,
        }
    }

    fn warn(&mut self, warning: ReleaseWarning) {
        warn!(stage = %self.stage, "{}", warning);
        self.warnings.push(warning);
    }

    fn finish(self, outcome: Result<()>) -> CycleResult {
        match outcome {
            Ok(()) => {
                info!(stage = %self.stage, warnings = self.warnings.len(), "cycle completed");
                CycleResult {
                    stage_reached: self.stage,
                    success: true,
                    error_detail: None,
                    release: self.release,
                    skipped: self.skipped,
                    warnings: self.warnings,
                }
            }
            Err(e) => {
                let stage = e.stage_of().unwrap_or(self.stage);
                error!(stage = %stage, error = %e, "cycle failed");
                CycleResult {
                    stage_reached: stage,
                    success: false,
                    error_detail: Some(e.to_string()),
                    release: self.release,
                    skipped: self.skipped,
                    warnings: self.warnings,
                }
            }
        }
    }
}

/// Attribute an error to `stage` unless it already carries one
fn in_stage(stage: Stage) -> impl FnOnce(ReleaseError) -> ReleaseError {
    move |err| match err {
        ReleaseError::Stage { .. } => err,
        other => ReleaseError::stage(stage, other.to_string()),
    }
}

/// Require a zero exit status, naming `action` in the failure
fn checked(stage: Stage, action: &str, output: Result<CommandOutput>) -> Result<CommandOutput> {
    let output = output.map_err(in_stage(stage))?;
    if output.is_success() {
        Ok(output)
    } else {
        Err(ReleaseError::stage(
            stage,
            format!("{}: {}", action, output.failure_detail()),
        ))
    }
}

/// Drives the build-and-release cycle through a [CommandRunner]
pub struct Orchestrator<R: CommandRunner> {
    runner: R,
    settings: PipelineSettings,
    confirmation: Box<dyn ConfirmationPolicy>,
    generator: Box<dyn CommitMessageGenerator>,
    classifier: ChangeClassifier,
}

impl<R: CommandRunner> Orchestrator<R> {
    /// Create an orchestrator.
    ///
    /// # Returns
    /// * `Err` - If the tag pattern or classifier settings are invalid
    pub fn new(
        runner: R,
        settings: PipelineSettings,
        confirmation: Box<dyn ConfirmationPolicy>,
        generator: Box<dyn CommitMessageGenerator>,
    ) -> Result<Self> {
        settings.release.tag_pattern().validate()?;
        let classifier = ChangeClassifier::new(&settings.classifier)?;
        Ok(Orchestrator {
            runner,
            settings,
            confirmation,
            generator,
            classifier,
        })
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    fn git(&self) -> GitCli<'_, R> {
        GitCli::new(&self.runner, &self.settings.project_dir)
    }

    fn cargo(&self) -> CargoCli<'_, R> {
        CargoCli::new(
            &self.runner,
            &self.settings.project_dir,
            self.settings.build.clone(),
        )
    }

    fn gh(&self) -> GhCli<'_, R> {
        GhCli::new(&self.runner, &self.settings.project_dir)
    }

    /// Run every stage once and report how far the cycle got.
    pub fn run_cycle(&self) -> CycleResult {
        info!(project = %self.settings.project_dir.display(), "starting cycle");
        let mut state = CycleState::new();
        let outcome = self.run_stages(&mut state);
        state.finish(outcome)
    }

    /// Move to `stage` and ask whether to run it
    fn enter(&self, state: &mut CycleState, stage: Stage) -> bool {
        state.stage = stage;
        if self.confirmation.confirm(stage.prompt()) {
            info!(stage = %stage, "stage started");
            true
        } else {
            info!(stage = %stage, "stage skipped");
            state.skipped.push(stage);
            false
        }
    }

    fn run_stages(&self, state: &mut CycleState) -> Result<()> {
        let git = self.git();
        let cargo = self.cargo();

        if self.enter(state, Stage::PullLatest) {
            checked(Stage::PullLatest, "git pull", git.pull())?;
        }

        if self.enter(state, Stage::Build) {
            checked(Stage::Build, "cargo build", cargo.build())?;
        }

        if self.enter(state, Stage::CopyArtifact) {
            let package = manifest::read_package_info(&self.settings.manifest_path())
                .map_err(in_stage(Stage::CopyArtifact))?;
            cargo
                .locate_and_copy_artifact(&package.name, &self.settings.artifact_dir)
                .map_err(in_stage(Stage::CopyArtifact))?;
        }

        if self.enter(state, Stage::Test) {
            checked(Stage::Test, "cargo test", cargo.test())?;
        }

        let message = if self.enter(state, Stage::GenerateCommitMessage) {
            self.generate_commit_message(state)
        } else {
            DEFAULT_COMMIT_MESSAGE.to_string()
        };

        if self.enter(state, Stage::CommitAndPush) {
            self.commit_and_push(state, &message)?;
        }

        if self.settings.skip_release {
            info!("release skipped by request");
            return Ok(());
        }
        if !self.confirmation.confirm(RELEASE_PROMPT) {
            info!("release declined");
            return Ok(());
        }
        release::run_release(self, state)
    }

    /// Never fails: every problem degrades to the default message.
    fn generate_commit_message(&self, state: &mut CycleState) -> String {
        match self.git().diff_since_primary_branch() {
            Ok(DiffSummary::NoChanges) => NO_CHANGES_COMMIT_MESSAGE.to_string(),
            Ok(DiffSummary::Changes(diff)) => match self.generator.generate(&diff) {
                Ok(message) => message,
                Err(e) => {
                    state.warn(ReleaseWarning::GeneratorFailed {
                        generator: self.generator.name().to_string(),
                        reason: e.to_string(),
                    });
                    DEFAULT_COMMIT_MESSAGE.to_string()
                }
            },
            Err(ReleaseError::NoRemoteBranch) => {
                state.warn(ReleaseWarning::NoRemoteBranch);
                DEFAULT_COMMIT_MESSAGE.to_string()
            }
            Err(e) => {
                warn!(stage = %state.stage, error = %e, "cannot diff against primary branch, using default message");
                DEFAULT_COMMIT_MESSAGE.to_string()
            }
        }
    }

    fn commit_and_push(&self, state: &mut CycleState, message: &str) -> Result<()> {
        let git = self.git();
        checked(Stage::CommitAndPush, "git add", git.add(&["."]))?;

        let commit = git.commit(message).map_err(in_stage(Stage::CommitAndPush))?;
        if commit.is_success() {
            info!(commit_message = message, "changes committed");
        } else {
            state.warn(ReleaseWarning::NothingToCommit {
                detail: commit.failure_detail(),
            });
        }

        checked(Stage::CommitAndPush, "git push", git.push())?;
        Ok(())
    }
}

impl<R: CommandRunner> CycleRunner for Orchestrator<R> {
    fn run_cycle(&mut self) -> CycleResult {
        Orchestrator::run_cycle(self)
    }
}
