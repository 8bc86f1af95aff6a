//! Domain logic - pure release rules independent of any external tool

pub mod branch;
pub mod changeset;
pub mod tag;
pub mod version;

pub use branch::PrimaryBranch;
pub use changeset::ChangeSet;
pub use tag::TagPattern;
pub use version::{fallback_bump, BumpKind, VersionNumber, DEFAULT_PRERELEASE_MARKER};
