//! Predicates for git-syncer command output

#![allow(dead_code)]

use predicates::prelude::*;

pub fn not_in_git_repo() -> impl Predicate<str> {
    predicates::str::contains("Not in a git repository")
}

pub fn no_changes() -> impl Predicate<str> {
    predicates::str::contains("No changes to sync")
}

pub fn missing_token() -> impl Predicate<str> {
    predicates::str::contains("No access token found")
}

/// `(modified) path` style preview line
pub fn has_change(label: &str, path: &str) -> impl Predicate<str> {
    predicates::str::contains(format!("({}) {}", label, path))
}
