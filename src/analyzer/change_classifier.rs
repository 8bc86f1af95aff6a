use std::collections::BTreeMap;

use regex::Regex;

use crate::config::ClassifierConfig;
use crate::domain::{BumpKind, ChangeSet};
use crate::error::{ReleaseError, Result};

/// Path of the build manifest, relative to the project root.
pub const MANIFEST_PATH: &str = "Cargo.toml";

/// Source directory prefix whose diffs are scanned for new public items.
pub const SOURCE_DIR: &str = "src/";

/// Classifies a change set into a version bump kind.
///
/// Major bumps are never inferred here; they only happen when requested explicitly.
pub struct ChangeClassifier {
    dependency_markers: Vec<String>,
    export_pattern: Option<Regex>,
}

impl ChangeClassifier {
    /// Create a new classifier from configured markers
    pub fn new(config: &ClassifierConfig) -> Result<Self> {
        let keywords: Vec<String> = config
            .export_keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(regex::escape)
            .collect();

        // Added lines only; `pub(crate)` and friends are not exported.
        let export_pattern = if keywords.is_empty() {
            None
        } else {
            let pattern = format!(
                r"(?m)^\+[ \t]*pub[ \t]+(?:(?:async|const|unsafe)[ \t]+)*(?:{})\b",
                keywords.join("|")
            );
            Some(Regex::new(&pattern).map_err(|e| {
                ReleaseError::config(format!("Invalid export keywords: {}", e))
            })?)
        };

        Ok(ChangeClassifier {
            dependency_markers: config.dependency_markers.clone(),
            export_pattern,
        })
    }

    /// Classify a change set produced by `git diff`
    pub fn classify_change_set(&self, changes: &ChangeSet) -> BumpKind {
        self.classify(&changes.paths(), changes.diffs())
    }

    /// Determine the bump kind from changed paths and their diff text
    pub fn classify(
        &self,
        changed_paths: &[String],
        diff_text_by_path: &BTreeMap<String, String>,
    ) -> BumpKind {
        for path in changed_paths {
            let Some(diff) = diff_text_by_path.get(path) else {
                continue;
            };

            if is_manifest(path) && self.touches_dependencies(diff) {
                return BumpKind::Minor;
            }

            if path.starts_with(SOURCE_DIR) && self.adds_public_item(diff) {
                return BumpKind::Minor;
            }
        }

        BumpKind::Patch
    }

    fn touches_dependencies(&self, diff: &str) -> bool {
        self.dependency_markers
            .iter()
            .any(|marker| diff.contains(marker.as_str()))
    }

    fn adds_public_item(&self, diff: &str) -> bool {
        self.export_pattern
            .as_ref()
            .is_some_and(|re| re.is_match(diff))
    }
}

fn is_manifest(path: &str) -> bool {
    path == MANIFEST_PATH
}
