use crate::error::{ReleaseError, Result};

/// Candidate primary branches, in order of precedence.
pub const PRIMARY_BRANCH_CANDIDATES: [&str; 2] = ["origin/main", "origin/master"];

/// The canonical upstream branch used as a diff baseline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryBranch {
    pub name: String,
}

impl PrimaryBranch {
    /// Pick the primary branch out of `git branch -r` output.
    ///
    /// `origin/main` wins over `origin/master` regardless of listing order.
    pub fn resolve(remote_listing: &str) -> Result<Self> {
        let listed: Vec<&str> = remote_listing
            .lines()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            // symbolic entries look like "origin/HEAD -> origin/main"
            .filter(|line| !line.contains("->"))
            .collect();

        for candidate in PRIMARY_BRANCH_CANDIDATES {
            if listed.contains(&candidate) {
                return Ok(PrimaryBranch {
                    name: candidate.to_string(),
                });
            }
        }

        Err(ReleaseError::NoRemoteBranch)
    }
}
