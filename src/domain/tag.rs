use crate::error::{ReleaseError, Result};

/// Tag naming pattern (e.g., "v{version}", "release-{version}")
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPattern {
    pub pattern: String,
}

impl Default for TagPattern {
    fn default() -> Self {
        TagPattern::new("v{version}")
    }
}

impl TagPattern {
    /// Create a new tag pattern
    pub fn new(pattern: impl Into<String>) -> Self {
        TagPattern {
            pattern: pattern.into(),
        }
    }

    /// Check the pattern carries the `{version}` placeholder
    pub fn validate(&self) -> Result<()> {
        if self.pattern.matches("{version}").count() != 1 {
            return Err(ReleaseError::config(format!(
                "Tag pattern '{}' must contain exactly one {{version}} placeholder",
                self.pattern
            )));
        }
        Ok(())
    }

    /// Format a version according to pattern
    /// Example: pattern="v{version}", version="1.2.3" -> "v1.2.3"
    pub fn format(&self, version: &str) -> String {
        self.pattern.replace("{version}", version)
    }

    /// Extract the version text from a tag produced by this pattern
    ///
    /// Returns `None` if the tag does not match the pattern's prefix and suffix.
    pub fn version_part<'a>(&self, tag: &'a str) -> Option<&'a str> {
        let (prefix, suffix) = self.pattern.split_once("{version}")?;
        let rest = tag.trim().strip_prefix(prefix)?;
        let version = rest.strip_suffix(suffix)?;
        if version.is_empty() {
            None
        } else {
            Some(version)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_format() {
        let pattern = TagPattern::default();
        assert_eq!(pattern.format("0.2.0-beta"), "v0.2.0-beta");
    }

    #[test]
    fn test_pattern_custom_prefix() {
        let pattern = TagPattern::new("release-{version}");
        assert_eq!(pattern.format("1.0.0"), "release-1.0.0");
        assert_eq!(pattern.version_part("release-1.0.0"), Some("1.0.0"));
    }

    #[test]
    fn test_version_part_mismatch() {
        let pattern = TagPattern::default();
        assert_eq!(pattern.version_part("v1.2.3"), Some("1.2.3"));
        assert_eq!(pattern.version_part("1.2.3"), None);
        assert_eq!(pattern.version_part("v"), None);
    }

    #[test]
    fn test_validate() {
        assert!(TagPattern::default().validate().is_ok());
        assert!(TagPattern::new("latest").validate().is_err());
        assert!(TagPattern::new("{version}-{version}").validate().is_err());
    }
}
