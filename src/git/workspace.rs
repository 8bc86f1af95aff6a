use crate::error::{ReleaseError, Result};
use git2::Repository as Git2Repo;
use std::path::{Path, PathBuf};

/// Location of the project inside its git repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    /// Directory the cycle runs in (holds the manifest)
    pub project_dir: PathBuf,
    /// Root of the enclosing git work tree
    pub work_tree: PathBuf,
}

/// Open or discover the git repository containing `path`.
///
/// Bare repositories are rejected since every cycle edits the working tree.
pub fn discover<P: AsRef<Path>>(path: P) -> Result<Workspace> {
    let path = path.as_ref();
    let project_dir = path.canonicalize().map_err(|e| {
        ReleaseError::Workspace(format!("Cannot access {}: {}", path.display(), e))
    })?;

    let repo = Git2Repo::discover(&project_dir).map_err(|e| {
        ReleaseError::Workspace(format!(
            "Not in a git repository ({}): {}",
            project_dir.display(),
            e.message()
        ))
    })?;

    let work_tree = repo
        .workdir()
        .ok_or_else(|| {
            ReleaseError::Workspace(format!(
                "Repository at {} has no working tree",
                repo.path().display()
            ))
        })?
        .to_path_buf();

    Ok(Workspace {
        project_dir,
        work_tree,
    })
}
