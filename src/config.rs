use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{TagPattern, DEFAULT_PRERELEASE_MARKER};
use crate::error::{ReleaseError, Result};

/// File name looked up in the project directory.
pub const PROJECT_CONFIG_FILE: &str = "release-cycle.toml";

/// Represents the complete configuration for release-cycle.
///
/// Contains hosting credentials, commit message generation settings, build options,
/// release tagging behavior and the markers used to classify changes.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default, rename = "vcs-auth")]
    pub vcs_auth: VcsAuthConfig,

    #[serde(default, rename = "commit-message")]
    pub commit_message: CommitMessageConfig,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub release: ReleaseConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,
}

/// Credentials for the release-hosting CLI.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct VcsAuthConfig {
    #[serde(default)]
    pub token: Option<String>,
}

impl VcsAuthConfig {
    /// The configured token, or an authentication error when absent or blank.
    pub fn require_token(&self) -> Result<&str> {
        match self.token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(ReleaseError::Authentication(
                "No token found in [vcs-auth] section of the configuration".to_string(),
            )),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

/// Settings for the external text-generation service used for commit messages.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CommitMessageConfig {
    #[serde(default)]
    pub use_generator: bool,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CommitMessageConfig {
    fn default() -> Self {
        CommitMessageConfig {
            use_generator: false,
            endpoint: default_endpoint(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_jobs() -> u32 {
    50
}

/// Build invocation settings. Builds always run in release mode.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BuildConfig {
    #[serde(default = "default_jobs")]
    pub jobs: u32,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            jobs: default_jobs(),
        }
    }
}

fn default_tag_pattern() -> String {
    "v{version}".to_string()
}

fn default_prerelease_marker() -> String {
    DEFAULT_PRERELEASE_MARKER.to_string()
}

/// Release tagging behavior.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReleaseConfig {
    #[serde(default = "default_tag_pattern")]
    pub tag_pattern: String,

    #[serde(default = "default_prerelease_marker")]
    pub prerelease_marker: String,

    /// Also create a hosted release with generated notes after pushing the tag.
    #[serde(default)]
    pub publish: bool,
}

impl ReleaseConfig {
    pub fn tag_pattern(&self) -> TagPattern {
        TagPattern::new(self.tag_pattern.clone())
    }
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        ReleaseConfig {
            tag_pattern: default_tag_pattern(),
            prerelease_marker: default_prerelease_marker(),
            publish: false,
        }
    }
}

/// Returns the default manifest markers that denote a dependency section.
fn default_dependency_markers() -> Vec<String> {
    vec![
        "[dependencies]".to_string(),
        "[dev-dependencies]".to_string(),
        "[build-dependencies]".to_string(),
        "[workspace.dependencies]".to_string(),
    ]
}

/// Returns the default item kinds whose new public declarations imply a minor bump.
fn default_export_keywords() -> Vec<String> {
    vec!["fn".to_string(), "struct".to_string(), "enum".to_string()]
}

/// Markers used to classify a change set into a bump kind.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ClassifierConfig {
    #[serde(default = "default_dependency_markers")]
    pub dependency_markers: Vec<String>,

    #[serde(default = "default_export_keywords")]
    pub export_keywords: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            dependency_markers: default_dependency_markers(),
            export_keywords: default_export_keywords(),
        }
    }
}

impl Config {
    /// Reject settings that would only fail later, mid-cycle.
    pub fn validate(&self) -> Result<()> {
        self.release.tag_pattern().validate()?;
        semver::Prerelease::new(&self.release.prerelease_marker).map_err(|e| {
            ReleaseError::config(format!(
                "Invalid prerelease_marker '{}': {}",
                self.release.prerelease_marker, e
            ))
        })?;
        if self.release.prerelease_marker.is_empty() {
            return Err(ReleaseError::config("prerelease_marker must not be empty"));
        }
        if self.build.jobs == 0 {
            return Err(ReleaseError::config("[build] jobs must be at least 1"));
        }
        Ok(())
    }
}

/// Resolves which configuration file to read, if any.
///
/// Lookup order:
/// 1. Custom path provided as parameter (must exist)
/// 2. `release-cycle.toml` in the project directory
/// 3. `<config_dir>/release-cycle/config.toml` in the user config directory
pub fn locate_config(config_path: Option<&Path>, project_dir: &Path) -> Result<Option<PathBuf>> {
    if let Some(path) = config_path {
        if !path.exists() {
            return Err(ReleaseError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }
        return Ok(Some(path.to_path_buf()));
    }

    let project_config = project_dir.join(PROJECT_CONFIG_FILE);
    if project_config.exists() {
        return Ok(Some(project_config));
    }

    if let Some(config_dir) = dirs::config_dir() {
        let user_config = config_dir.join("release-cycle").join("config.toml");
        if user_config.exists() {
            return Ok(Some(user_config));
        }
    }

    Ok(None)
}

/// Loads configuration from file or returns defaults.
///
/// # Returns
/// * `Ok(Config)` - Loaded and validated or default configuration
/// * `Err` - If a file exists but cannot be read, parsed or validated
pub fn load_config(config_path: Option<&Path>, project_dir: &Path) -> Result<Config> {
    let config = match locate_config(config_path, project_dir)? {
        Some(path) => {
            let config_str = fs::read_to_string(&path).map_err(|e| {
                ReleaseError::config(format!("Cannot read {}: {}", path.display(), e))
            })?;
            parse_config(&config_str)
                .map_err(|e| ReleaseError::config(format!("{}: {}", path.display(), e)))?
        }
        None => Config::default(),
    };

    config.validate()?;
    Ok(config)
}

/// Parse configuration text without touching the filesystem.
pub fn parse_config(config_str: &str) -> std::result::Result<Config, toml::de::Error> {
    toml::from_str(config_str)
}
