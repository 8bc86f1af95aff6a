//! Commit message generation
//!
//! The orchestrator holds one [CommitMessageGenerator], chosen at start-up:
//! [StaticMessage] always returns the same text, [OllamaGenerator] asks an
//! Ollama server to summarise the pending diff. Failures of the latter are
//! never fatal; the orchestrator falls back to [DEFAULT_COMMIT_MESSAGE].

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::CommitMessageConfig;
use crate::error::{ReleaseError, Result};

/// Used when no generator is configured or the generator fails
pub const DEFAULT_COMMIT_MESSAGE: &str = "Automated build commit";

/// Used whenever the diff against the primary branch is empty, whatever the generator
pub const NO_CHANGES_COMMIT_MESSAGE: &str =
    "Automated commit: No changes detected, repository updated.";

/// Upper bound on diff text sent to the model
const MAX_DIFF_CHARS: usize = 16_000;

/// Produces a commit message from a summary of the pending changes
pub trait CommitMessageGenerator {
    /// Short name for logs
    fn name(&self) -> &str;

    fn generate(&self, diff_summary: &str) -> Result<String>;
}

/// Returns a fixed message
#[derive(Debug, Clone)]
pub struct StaticMessage {
    message: String,
}

impl StaticMessage {
    pub fn new(message: impl Into<String>) -> Self {
        StaticMessage {
            message: message.into(),
        }
    }
}

impl Default for StaticMessage {
    fn default() -> Self {
        StaticMessage::new(DEFAULT_COMMIT_MESSAGE)
    }
}

impl CommitMessageGenerator for StaticMessage {
    fn name(&self) -> &str {
        "static"
    }

    fn generate(&self, _diff_summary: &str) -> Result<String> {
        Ok(self.message.clone())
    }
}

/// Ollama `/api/generate` request body
#[derive(Serialize, Debug)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
}

/// Ollama `/api/generate` response body (non-streaming)
#[derive(Deserialize, Debug)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Generates commit messages with a model served by Ollama
pub struct OllamaGenerator {
    client: Client,
    endpoint: String,
    model: String,
}

impl OllamaGenerator {
    /// Create a generator from the `[commit-message]` configuration
    pub fn new(config: &CommitMessageConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ReleaseError::external(format!("Cannot build HTTP client: {}", e)))?;

        Ok(OllamaGenerator {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    fn url(&self) -> String {
        format!("{}/api/generate", self.endpoint)
    }
}

impl CommitMessageGenerator for OllamaGenerator {
    fn name(&self) -> &str {
        "ollama"
    }

    fn generate(&self, diff_summary: &str) -> Result<String> {
        info!(model = %self.model, endpoint = %self.endpoint, "generating commit message");

        let request = GenerateRequest {
            model: &self.model,
            prompt: build_prompt(diff_summary),
            stream: false,
        };

        let response = self
            .client
            .post(self.url())
            .json(&request)
            .send()
            .map_err(|e| ReleaseError::external(format!("Request to {} failed: {}", self.url(), e)))?;

        let status = response.status();
        let text = response
            .text()
            .map_err(|e| ReleaseError::external(format!("Cannot read response body: {}", e)))?;
        if !status.is_success() {
            return Err(ReleaseError::external(format!(
                "Ollama returned {}: {}",
                status,
                text.trim()
            )));
        }

        let body: GenerateResponse = serde_json::from_str(&text).map_err(|e| {
            ReleaseError::external(format!("Invalid response body ({}): {}", e, text.trim()))
        })?;
        debug!(raw = %body.response, "raw model response");

        let message = clean_message(&body.response);
        if message.is_empty() {
            return Err(ReleaseError::external("Model returned an empty commit message"));
        }
        info!(commit_message = %message, "generated commit message");
        Ok(message)
    }
}

/// Instructions plus the (possibly truncated) diff
pub fn build_prompt(diff_summary: &str) -> String {
    let diff = truncate_chars(diff_summary, MAX_DIFF_CHARS);
    format!(
        "Write a concise, factual git commit message for the changes below, which touch \
         the Rust sources and Cargo.toml of a project. Reply with the commit message only, \
         one change per line, for example:\n\
         - Added retry handling to the HTTP client.\n\
         - Updated dependencies to their latest patch releases.\n\n\
         Changes:\n{}",
        diff
    )
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Trim whitespace and a single pair of wrapping quotes or backticks
fn clean_message(raw: &str) -> String {
    let trimmed = raw.trim();
    let unwrapped = ['"', '\'', '`']
        .iter()
        .find_map(|q| {
            trimmed
                .strip_prefix(*q)
                .and_then(|rest| rest.strip_suffix(*q))
        })
        .unwrap_or(trimmed);
    unwrapped.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_message() {
        let generator = StaticMessage::default();
        assert_eq!(generator.generate("anything").unwrap(), DEFAULT_COMMIT_MESSAGE);
        assert_eq!(
            StaticMessage::new("nightly build").generate("").unwrap(),
            "nightly build"
        );
    }

    #[test]
    fn test_prompt_contains_diff() {
        let prompt = build_prompt("+pub fn added() {}");
        assert!(prompt.contains("Changes:\n+pub fn added() {}"));
    }

    #[test]
    fn test_prompt_truncates_large_diff() {
        let huge = "x".repeat(MAX_DIFF_CHARS + 500);
        let prompt = build_prompt(&huge);
        assert!(prompt.len() < huge.len());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_clean_message() {
        assert_eq!(clean_message("  \"Fix build\"\n"), "Fix build");
        assert_eq!(clean_message("`Fix build`"), "Fix build");
        assert_eq!(clean_message("- Added x\n- Fixed y\n"), "- Added x\n- Fixed y");
        assert_eq!(clean_message("   "), "");
    }

    #[test]
    fn test_endpoint_trailing_slash() {
        let config = CommitMessageConfig {
            endpoint: "http://localhost:11434/".to_string(),
            ..CommitMessageConfig::default()
        };
        let generator = OllamaGenerator::new(&config).unwrap();
        assert_eq!(generator.url(), "http://localhost:11434/api/generate");
    }
}
