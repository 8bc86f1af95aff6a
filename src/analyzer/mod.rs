//! Analysis engine for determining version bumps from diffs

pub mod change_classifier;

pub use change_classifier::{ChangeClassifier, MANIFEST_PATH, SOURCE_DIR};
