use std::collections::BTreeMap;

/// Files modified since a base revision, with the diff text of each file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    diffs: BTreeMap<String, String>,
}

impl ChangeSet {
    /// Split unified `git diff` output into per-file sections.
    ///
    /// Each section starts at a `diff --git a/<path> b/<path>` header and is keyed
    /// by the post-image path.
    pub fn from_diff(diff_text: &str) -> Self {
        let mut diffs = BTreeMap::new();
        let mut current: Option<(String, String)> = None;

        for line in diff_text.lines() {
            if let Some(header) = line.strip_prefix("diff --git ") {
                if let Some((path, body)) = current.take() {
                    diffs.insert(path, body);
                }
                let path = header
                    .rsplit_once(" b/")
                    .map(|(_, post)| post.to_string())
                    .unwrap_or_else(|| header.to_string());
                current = Some((path, String::new()));
            }

            if let Some((_, body)) = current.as_mut() {
                body.push_str(line);
                body.push('\n');
            }
        }

        if let Some((path, body)) = current {
            diffs.insert(path, body);
        }

        ChangeSet { diffs }
    }

    pub fn paths(&self) -> Vec<String> {
        self.diffs.keys().cloned().collect()
    }

    pub fn diff_for(&self, path: &str) -> Option<&str> {
        self.diffs.get(path).map(|s| s.as_str())
    }

    pub fn diffs(&self) -> &BTreeMap<String, String> {
        &self.diffs
    }

    pub fn is_empty(&self) -> bool {
        self.diffs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diffs.len()
    }
}
