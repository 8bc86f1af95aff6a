use std::fmt;

/// Non-fatal conditions met during a cycle.
/// They are logged and reported, never turned into a failed cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum ReleaseWarning {
    /// The hosting service has no release yet; the manifest version is used as-is
    NoPublishedRelease { manifest_version: String },
    /// The manifest already carries a version beyond the published one
    ManifestAhead { manifest: String, published: String },
    /// A version could not be parsed; the non-semantic fallback bump was used
    UnparsableVersion { version: String, reason: String },
    /// Neither origin/main nor origin/master exists
    NoRemoteBranch,
    /// The commit message generator failed; the default message was used
    GeneratorFailed { generator: String, reason: String },
    /// `git commit` exited non-zero, usually because the tree was clean
    NothingToCommit { detail: String },
    /// Creating the hosted release for an already-pushed tag failed
    PublishFailed { tag: String, reason: String },
}

impl fmt::Display for ReleaseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseWarning::NoPublishedRelease { manifest_version } => write!(
                f,
                "No published release found, releasing manifest version {}",
                manifest_version
            ),
            ReleaseWarning::ManifestAhead {
                manifest,
                published,
            } => write!(
                f,
                "Manifest version {} is already ahead of published {}",
                manifest, published
            ),
            ReleaseWarning::UnparsableVersion { version, reason } => {
                write!(f, "Cannot parse version '{}': {}", version, reason)
            }
            ReleaseWarning::NoRemoteBranch => {
                write!(f, "No origin/main or origin/master branch found")
            }
            ReleaseWarning::GeneratorFailed { generator, reason } => write!(
                f,
                "Commit message generator '{}' failed, using default message: {}",
                generator, reason
            ),
            ReleaseWarning::NothingToCommit { detail } => {
                let first_line = detail.lines().next().unwrap_or("").trim();
                if first_line.is_empty() {
                    write!(f, "Nothing to commit")
                } else {
                    write!(f, "Nothing to commit ({})", first_line)
                }
            }
            ReleaseWarning::PublishFailed { tag, reason } => {
                write!(f, "Failed to publish release for tag '{}': {}", tag, reason)
            }
        }
    }
}
