use crate::error::{ReleaseError, Result};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Marker appended to every computed version. Tags are pushed with it in place;
/// there is no finalize step that strips it.
pub const DEFAULT_PRERELEASE_MARKER: &str = "beta";

/// Semantic version with an optional pre-release tag
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionNumber {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub prerelease: Option<String>,
}

impl VersionNumber {
    /// Create a release version (no pre-release tag)
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        VersionNumber {
            major,
            minor,
            patch,
            prerelease: None,
        }
    }

    /// Attach a pre-release tag
    pub fn with_prerelease(mut self, tag: impl Into<String>) -> Self {
        self.prerelease = Some(tag.into());
        self
    }

    /// Parse `MAJOR.MINOR.PATCH[-tag]`, tolerating a leading `v`/`V`.
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let clean = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);

        let (core, prerelease) = match clean.split_once('-') {
            Some((core, tag)) => (core, Some(tag)),
            None => (clean, None),
        };

        let parts: Vec<&str> = core.split('.').collect();
        if parts.len() != 3 {
            return Err(ReleaseError::version(format!(
                "Invalid version format: '{}' - expected MAJOR.MINOR.PATCH",
                s
            )));
        }

        let component = |name: &str, raw: &str| {
            let invalid =
                || ReleaseError::version(format!("Invalid {} version component: '{}'", name, raw));
            // u64::from_str would also take a leading '+'
            if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            raw.parse::<u64>().map_err(|_| invalid())
        };

        let major = component("major", parts[0])?;
        let minor = component("minor", parts[1])?;
        let patch = component("patch", parts[2])?;

        let prerelease = match prerelease {
            Some(tag) => {
                semver::Prerelease::new(tag).map_err(|e| {
                    ReleaseError::version(format!("Invalid pre-release tag '{}': {}", tag, e))
                })?;
                if tag.is_empty() {
                    return Err(ReleaseError::version(format!(
                        "Empty pre-release tag in '{}'",
                        s
                    )));
                }
                Some(tag.to_string())
            }
            None => None,
        };

        Ok(VersionNumber {
            major,
            minor,
            patch,
            prerelease,
        })
    }

    /// Compare the `(major, minor, patch)` cores only; pre-release tags are ignored.
    pub fn compare(a: &VersionNumber, b: &VersionNumber) -> Ordering {
        a.core().cmp(&b.core())
    }

    pub fn core(&self) -> (u64, u64, u64) {
        (self.major, self.minor, self.patch)
    }

    pub fn is_prerelease(&self) -> bool {
        self.prerelease.is_some()
    }

    /// Bump according to `kind`. The result always carries `marker`.
    ///
    /// Fails with [ReleaseError::Version] when the bumped component is already
    /// `u64::MAX`.
    pub fn increment(&self, kind: BumpKind, marker: &str) -> Result<Self> {
        let bump = |component: u64| {
            component.checked_add(1).ok_or_else(|| {
                ReleaseError::version(format!("Cannot apply a {} bump to {}", kind, self))
            })
        };
        let (major, minor, patch) = match kind {
            BumpKind::Major => (bump(self.major)?, 0, 0),
            BumpKind::Minor => (self.major, bump(self.minor)?, 0),
            BumpKind::Patch => (self.major, self.minor, bump(self.patch)?),
        };
        Ok(VersionNumber::new(major, minor, patch).with_prerelease(marker))
    }
}

impl Ord for VersionNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        VersionNumber::compare(self, other).then_with(|| {
            match (&self.prerelease, &other.prerelease) {
                (None, None) => Ordering::Equal,
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (Some(a), Some(b)) => a.cmp(b),
            }
        })
    }
}

impl PartialOrd for VersionNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for VersionNumber {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        VersionNumber::parse(s)
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(tag) = &self.prerelease {
            write!(f, "-{}", tag)?;
        }
        Ok(())
    }
}

/// Magnitude of a pending version increment
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BumpKind {
    Patch,
    Minor,
    Major,
}

impl fmt::Display for BumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BumpKind::Patch => write!(f, "patch"),
            BumpKind::Minor => write!(f, "minor"),
            BumpKind::Major => write!(f, "major"),
        }
    }
}

/// Non-semantic bump used when a version string cannot be parsed.
///
/// Increments a trailing `-N` counter, otherwise appends `-1`.
pub fn fallback_bump(version: &str) -> String {
    let version = version.trim();
    if let Some((head, counter)) = version.rsplit_once('-') {
        if !counter.is_empty() && counter.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(n) = counter.parse::<u64>() {
                return format!("{}-{}", head, n + 1);
            }
        }
    }
    format!("{}-1", version)
}
