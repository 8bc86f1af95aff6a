//! Release sub-flow: decide the next version, record it, tag it and push it.
//!
//! The published version on the hosting service is the baseline. When there
//! is none, the manifest version is released as-is. When the manifest is
//! already ahead it is kept. Otherwise the changes since the latest release
//! tag are classified and the published version is bumped. An empty change
//! set means nothing to release, so running the flow twice never bumps twice.

use tracing::{debug, info, warn};

use super::{checked, in_stage, CycleState, Orchestrator, Stage};
use crate::analyzer::MANIFEST_PATH;
use crate::domain::{fallback_bump, BumpKind, ChangeSet, TagPattern, VersionNumber};
use crate::error::{ReleaseError, Result};
use crate::git::DiffSummary;
use crate::manifest;
use crate::runner::CommandRunner;
use crate::warning::ReleaseWarning;

/// Version chosen by the release sub-flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseDecision {
    /// `[package] version` before the flow ran
    pub current_version: String,
    /// Latest version on the hosting service, if any release exists
    pub remote_version: Option<String>,
    /// Set only when a semantic bump was performed
    pub bump_kind: Option<BumpKind>,
    pub next_version: String,
    /// Tag name for `next_version`
    pub tag: String,
}

impl ReleaseDecision {
    fn keep(current: String, remote: Option<String>, pattern: &TagPattern) -> Self {
        ReleaseDecision {
            tag: pattern.format(&current),
            next_version: current.clone(),
            current_version: current,
            remote_version: remote,
            bump_kind: None,
        }
    }

    /// Whether the manifest has to be rewritten
    pub fn version_changed(&self) -> bool {
        self.next_version != self.current_version
    }
}

pub(super) fn run_release<R: CommandRunner>(
    orchestrator: &Orchestrator<R>,
    state: &mut CycleState,
) -> Result<()> {
    if !orchestrator.enter(state, Stage::DetermineVersion) {
        return abandon(Stage::DetermineVersion);
    }
    let decision =
        determine_version(orchestrator, state).map_err(in_stage(Stage::DetermineVersion))?;
    info!(
        current = %decision.current_version,
        next = %decision.next_version,
        tag = %decision.tag,
        "release version decided"
    );
    state.release = Some(decision.clone());

    if decision.version_changed() {
        if !orchestrator.enter(state, Stage::UpdateManifest) {
            return abandon(Stage::UpdateManifest);
        }
        update_manifest(orchestrator, &decision.next_version)?;
    }

    if !orchestrator.enter(state, Stage::TagRelease) {
        return abandon(Stage::TagRelease);
    }
    let git = orchestrator.git();
    if git
        .tag_exists(&decision.tag)
        .map_err(in_stage(Stage::TagRelease))?
    {
        info!(tag = %decision.tag, "tag already exists, nothing to push");
        return Ok(());
    }
    checked(
        Stage::TagRelease,
        "git tag",
        git.tag(&decision.tag, &format!("Release {}", decision.tag)),
    )?;

    if !orchestrator.enter(state, Stage::PushTag) {
        return abandon(Stage::PushTag);
    }
    push_tag(orchestrator, &decision.tag)?;

    if orchestrator.settings.release.publish {
        if !orchestrator.enter(state, Stage::PublishRelease) {
            return abandon(Stage::PublishRelease);
        }
        match orchestrator.gh().create_release(&decision.tag) {
            Ok(_) => info!(tag = %decision.tag, "release published"),
            Err(e) => state.warn(ReleaseWarning::PublishFailed {
                tag: decision.tag.clone(),
                reason: e.to_string(),
            }),
        }
    }

    Ok(())
}

fn abandon(stage: Stage) -> Result<()> {
    info!(stage = %stage, "release abandoned");
    Ok(())
}

fn determine_version<R: CommandRunner>(
    orchestrator: &Orchestrator<R>,
    state: &mut CycleState,
) -> Result<ReleaseDecision> {
    let settings = &orchestrator.settings;
    let pattern = settings.release.tag_pattern();
    let package = manifest::read_package_info(&settings.manifest_path())?;
    let current = package.version;

    let Some(published) = orchestrator.gh().latest_published_version(&pattern)? else {
        state.warn(ReleaseWarning::NoPublishedRelease {
            manifest_version: current.clone(),
        });
        return Ok(ReleaseDecision::keep(current, None, &pattern));
    };

    let published_version = match VersionNumber::parse(&published) {
        Ok(version) => version,
        Err(e) => {
            state.warn(ReleaseWarning::UnparsableVersion {
                version: published.clone(),
                reason: e.to_string(),
            });
            if changes_since_release(orchestrator)?.is_empty() {
                return Ok(ReleaseDecision::keep(current, Some(published), &pattern));
            }
            let next_version = fallback_bump(&published);
            return Ok(ReleaseDecision {
                tag: pattern.format(&next_version),
                current_version: current,
                remote_version: Some(published),
                bump_kind: None,
                next_version,
            });
        }
    };

    // an unreadable manifest version cannot be ahead; bump from the published one
    match VersionNumber::parse(&current) {
        Ok(manifest_version) if manifest_version > published_version => {
            state.warn(ReleaseWarning::ManifestAhead {
                manifest: current.clone(),
                published: published.clone(),
            });
            return Ok(ReleaseDecision::keep(current, Some(published), &pattern));
        }
        Ok(_) => {}
        Err(e) => state.warn(ReleaseWarning::UnparsableVersion {
            version: current.clone(),
            reason: e.to_string(),
        }),
    }

    let changes = changes_since_release(orchestrator)?;
    if changes.is_empty() {
        info!(published = %published, "no changes since the last release");
        return Ok(ReleaseDecision::keep(current, Some(published), &pattern));
    }

    let kind = orchestrator.classifier.classify_change_set(&changes);
    let next = published_version.increment(kind, &settings.release.prerelease_marker)?;
    debug!(bump = %kind, files = changes.len(), "classified changes");
    let next_version = next.to_string();
    Ok(ReleaseDecision {
        tag: pattern.format(&next_version),
        current_version: current,
        remote_version: Some(published),
        bump_kind: Some(kind),
        next_version,
    })
}

/// Changes since the latest release tag, or against the primary remote branch
/// when the history has no tag yet
fn changes_since_release<R: CommandRunner>(orchestrator: &Orchestrator<R>) -> Result<ChangeSet> {
    let git = orchestrator.git();
    let describe = git.latest_release_tag()?;
    let tag = describe.stdout.trim();
    if describe.is_success() && !tag.is_empty() {
        debug!(tag, "diffing against latest release tag");
        return git.change_set_since(tag);
    }

    info!("no release tag found, diffing against the primary remote branch");
    match git.diff_since_primary_branch()? {
        DiffSummary::NoChanges => Ok(ChangeSet::default()),
        DiffSummary::Changes(text) => Ok(ChangeSet::from_diff(&text)),
    }
}

fn update_manifest<R: CommandRunner>(orchestrator: &Orchestrator<R>, version: &str) -> Result<()> {
    manifest::write_package_version(&orchestrator.settings.manifest_path(), version)
        .map_err(in_stage(Stage::UpdateManifest))?;

    let git = orchestrator.git();
    checked(Stage::UpdateManifest, "git add", git.add(&[MANIFEST_PATH]))?;
    checked(
        Stage::UpdateManifest,
        "git commit",
        git.commit(&format!("Update version to {}", version)),
    )?;
    info!(version, "manifest version updated");
    Ok(())
}

/// Push tags, then the version commit. A rejected tag push removes the local
/// tag so the next cycle can create it again.
fn push_tag<R: CommandRunner>(orchestrator: &Orchestrator<R>, tag: &str) -> Result<()> {
    let git = orchestrator.git();
    let pushed = git.push_tags().map_err(in_stage(Stage::PushTag))?;
    if !pushed.is_success() {
        match git.delete_tag(tag) {
            Ok(output) if output.is_success() => info!(tag, "deleted local tag after failed push"),
            Ok(output) => warn!(tag, detail = %output.failure_detail(), "could not delete local tag"),
            Err(e) => warn!(tag, error = %e, "could not delete local tag"),
        }
        return Err(ReleaseError::stage(
            Stage::PushTag,
            format!("git push --tags: {}", pushed.failure_detail()),
        ));
    }

    checked(Stage::PushTag, "git push", git.push())?;
    info!(tag, "release tag pushed");
    Ok(())
}
