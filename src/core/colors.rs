//! Color scheme for change-set previews.
//!
//! # Public API
//! - [`get_change_color_style`]: Color function for a change kind
//! - [`format_change_line`]: One colored preview line
//! - [`colorize_diff_line`]: Color a line of patch text
//!
//! # Color Scheme
//! - **Modified**: Yellow
//! - **Added**: Green
//! - **Deleted**: Red
//! - **Renamed**: Blue

use crate::core::git_status::ChangeKind;
use colored::*;

pub fn get_change_color_style(kind: ChangeKind) -> Box<dyn Fn(&str) -> ColoredString> {
    match kind {
        ChangeKind::Modified => Box::new(|text: &str| text.yellow()),
        ChangeKind::Added => Box::new(|text: &str| text.green()),
        ChangeKind::Deleted => Box::new(|text: &str| text.red()),
        ChangeKind::Renamed => Box::new(|text: &str| text.blue()),
    }
}

/// `   (modified) src/lib.rs` with label and path in the kind's color
pub fn format_change_line(kind: ChangeKind, path: &str) -> String {
    let color_fn = get_change_color_style(kind);
    format!(
        "   {} {}",
        color_fn(&format!("({})", kind.label())),
        color_fn(path)
    )
}

pub fn colorize_diff_line(line: &str) -> ColoredString {
    if line.starts_with("+++") || line.starts_with("---") {
        line.bold()
    } else if line.starts_with('+') {
        line.green()
    } else if line.starts_with('-') {
        line.red()
    } else if line.starts_with("@@") {
        line.cyan()
    } else {
        line.normal()
    }
}
