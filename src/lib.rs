pub mod analyzer;
pub mod cargo_ops;
pub mod commit_message;
pub mod config;
pub mod domain;
pub mod error;
pub mod git;
pub mod github;
pub mod manifest;
pub mod orchestrator;
pub mod preflight;
pub mod runner;
pub mod scheduler;
pub mod ui;
pub mod warning;

pub use error::{ReleaseError, Result};
