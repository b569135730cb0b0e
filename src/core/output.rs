//! Unified output formatting utilities for consistent CLI presentation.
//!
//! # Design Principles
//! - **Consistent color scheme**: Red for errors, green for success, yellow for notices
//! - **Standardized spacing**: Newline before and after all command outputs

use colored::*;

/// Prints `✕ Error: <message>` with the prefix in red
pub fn print_error(message: &str) {
    println!("\n{} {}\n", "✕ Error:".red(), message.white());
}

/// Prints `✓ <message>` with the checkmark in green
pub fn print_success(message: &str) {
    println!("\n{} {}", "✓".green(), message.white());
}

/// Non-error notices such as "nothing to sync"
pub fn print_notice(message: &str) {
    println!("\n{}\n", message.yellow());
}

pub fn print_info(message: &str) {
    println!("\n{}\n", message.white());
}

pub fn print_section_header(header: &str) {
    println!("\n{}:\n", header.white());
}
