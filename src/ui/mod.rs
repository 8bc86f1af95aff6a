//! User interface module - confirmation prompts and formatting.
//!
//! - `formatter` - console output for cycle summaries and warnings
//! - This module - the confirmation policy consulted before every stage

use std::io::{self, BufRead, Write};

pub mod formatter;

pub use formatter::{
    display_cycle_result, display_error, display_release_decision, display_status,
    display_success, display_warning,
};

/// Decides whether a stage may proceed.
pub trait ConfirmationPolicy {
    /// `true` to run the step described by `prompt`, `false` to skip it
    fn confirm(&self, prompt: &str) -> bool;
}

/// Unattended mode: every stage proceeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysYes;

impl ConfirmationPolicy for AlwaysYes {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// Interactive mode: asks on the terminal before each stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptUser;

impl ConfirmationPolicy for PromptUser {
    fn confirm(&self, prompt: &str) -> bool {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        // an unreadable terminal counts as "no"
        confirm_action(prompt, &mut input, &mut io::stdout()).unwrap_or(false)
    }
}

/// Prompts with a yes/no question.
///
/// Accepts "y" or "yes" (case-insensitive) as confirmation.
/// Default is "no" if user presses Enter.
///
/// # Returns
/// * `Ok(true)` - If user entered "y" or "yes"
/// * `Ok(false)` - Otherwise (including Enter, end of input, or "n"/"no")
/// * `Err` - If reading or writing the terminal fails
pub fn confirm_action<R: BufRead, W: Write>(
    prompt: &str,
    input: &mut R,
    output: &mut W,
) -> io::Result<bool> {
    write!(output, "\n{} (y/N): ", prompt)?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;

    let response = line.trim().to_lowercase();
    Ok(response == "y" || response == "yes")
}
