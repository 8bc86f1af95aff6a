//! Console formatting for cycle output.
//!
//! The `format_*` functions build plain strings and are unit tested; the
//! `display_*` functions style and print them.

use console::style;

use crate::orchestrator::{CycleResult, ReleaseDecision};
use crate::warning::ReleaseWarning;

/// Print an error message in red on stderr.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Print a success message with a green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Print a status message with a yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Print a non-fatal warning on stderr.
pub fn display_warning(warning: &ReleaseWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), warning);
}

/// One-line description of a release decision
pub fn format_release_decision(decision: &ReleaseDecision) -> String {
    let published = decision.remote_version.as_deref().unwrap_or("none");
    match decision.bump_kind {
        Some(kind) => format!(
            "{} -> {} ({} bump over published {}), tag {}",
            decision.current_version, decision.next_version, kind, published, decision.tag
        ),
        None if decision.next_version != decision.current_version => format!(
            "{} -> {} (published {}), tag {}",
            decision.current_version, decision.next_version, published, decision.tag
        ),
        None => format!(
            "{} unchanged (published {}), tag {}",
            decision.current_version, published, decision.tag
        ),
    }
}

/// Show the version decided by the release sub-flow.
pub fn display_release_decision(decision: &ReleaseDecision) {
    println!(
        "{} {}",
        style("Release:").bold(),
        style(format_release_decision(decision)).cyan()
    );
}

/// Summary line for a finished cycle
pub fn format_cycle_summary(result: &CycleResult) -> String {
    if result.success {
        format!(
            "Cycle completed (last stage: {}, {} warning(s))",
            result.stage_reached,
            result.warnings.len()
        )
    } else {
        format!(
            "Cycle failed at stage {}: {}",
            result.stage_reached,
            result.error_detail.as_deref().unwrap_or("unknown error")
        )
    }
}

/// Print the end-of-cycle summary, including warnings and any release decision.
pub fn display_cycle_result(result: &CycleResult) {
    for warning in &result.warnings {
        display_warning(warning);
    }
    if let Some(decision) = &result.release {
        display_release_decision(decision);
    }
    if result.success {
        display_success(&format_cycle_summary(result));
    } else {
        display_error(&format_cycle_summary(result));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BumpKind;
    use crate::orchestrator::Stage;

    fn decision(next: &str, bump: Option<BumpKind>) -> ReleaseDecision {
        ReleaseDecision {
            current_version: "0.1.0".to_string(),
            remote_version: Some("0.1.0".to_string()),
            bump_kind: bump,
            next_version: next.to_string(),
            tag: format!("v{}", next),
        }
    }

    #[test]
    fn test_format_bumped_decision() {
        assert_eq!(
            format_release_decision(&decision("0.2.0-beta", Some(BumpKind::Minor))),
            "0.1.0 -> 0.2.0-beta (minor bump over published 0.1.0), tag v0.2.0-beta"
        );
    }

    #[test]
    fn test_format_unchanged_decision() {
        let mut unchanged = decision("0.1.0", None);
        unchanged.remote_version = None;
        assert_eq!(
            format_release_decision(&unchanged),
            "0.1.0 unchanged (published none), tag v0.1.0"
        );
    }

    #[test]
    fn test_format_failed_cycle() {
        let result = CycleResult::failed(Stage::Test, "exit code 101");
        assert_eq!(
            format_cycle_summary(&result),
            "Cycle failed at stage test: exit code 101"
        );
    }

    #[test]
    fn test_display_functions_do_not_panic() {
        display_status("pulling");
        display_success("done");
        display_error("broken");
        display_warning(&ReleaseWarning::NoRemoteBranch);
        display_cycle_result(&CycleResult::failed(Stage::Build, "boom"));
    }
}
