//! Lint target resolution.
//!
//! `ansible-lint` understands roles and playbooks, not loose task fragments.
//! A document living under a `tasks/` directory is therefore linted through
//! its enclosing role: the path is cut just before the first directory
//! component named `tasks` (ASCII case-insensitive).

use std::path::{Component, Path, PathBuf};

/// Path handed to the checker for a document at `document_path`.
///
/// Only directory components count: a file that happens to be named `tasks`
/// is linted as itself.
#[must_use]
pub fn lint_target(document_path: &Path) -> PathBuf {
    let components: Vec<Component<'_>> = document_path.components().collect();
    let Some(last) = components.len().checked_sub(1) else {
        return document_path.to_path_buf();
    };

    let tasks_dir = components[..last].iter().position(|c| match c {
        Component::Normal(name) => name
            .to_str()
            .is_some_and(|name| name.eq_ignore_ascii_case("tasks")),
        _ => false,
    });

    match tasks_dir {
        Some(idx) => components[..idx].iter().collect(),
        None => document_path.to_path_buf(),
    }
}
