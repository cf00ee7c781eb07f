//! Pure formatting functions for UI output.
//!
//! `format_*` build styled strings and are testable; `display_*` print them
//! to stderr, which keeps stdout free for the changelog itself.

use console::style;

use crate::warning::ChangelogWarning;

pub fn format_error(message: &str) -> String {
    format!("{} {}", style("ERROR:").red().bold(), message)
}

pub fn format_warning(warning: &ChangelogWarning) -> String {
    format!("{} {}", style("⚠ WARNING:").yellow(), warning)
}

pub fn format_success(message: &str) -> String {
    format!("{} {}", style("✓").green(), message)
}

/// Indented cause line shown under an error in debug mode
pub fn format_cause(cause: &str) -> String {
    format!("  {} {}", style("caused by:").dim(), cause)
}

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{}", format_error(message));
}

/// Print an advisory warning in yellow.
pub fn display_warning(warning: &ChangelogWarning) {
    eprintln!("{}", format_warning(warning));
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    eprintln!("{}", format_success(message));
}

pub fn display_cause(cause: &str) {
    eprintln!("{}", format_cause(cause));
}
