//! Lifecycle status rules.
//!
//! A [`StatusTransitionTable`] maps each status to the roles that may edit a
//! document in that status and to the statuses it may move to, each with the
//! roles allowed to make that move. Terminal statuses accept no changes at
//! all.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StatusError {
    #[error("{0}")]
    Forbidden(String),
}

pub type StatusResult<T> = Result<T, StatusError>;

/// Rules for one current status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRule {
    #[serde(default)]
    pub editing_roles: BTreeSet<String>,
    /// Target status → roles allowed to move there.
    #[serde(default)]
    pub next_status: BTreeMap<String, BTreeSet<String>>,
}

impl StatusRule {
    pub fn new(editing_roles: &[&str]) -> Self {
        Self {
            editing_roles: editing_roles.iter().map(|r| (*r).to_string()).collect(),
            next_status: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn allow(mut self, target: &str, roles: &[&str]) -> Self {
        self.next_status
            .insert(target.into(), roles.iter().map(|r| (*r).to_string()).collect());
        self
    }
}

/// Current status → [`StatusRule`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusTransitionTable(BTreeMap<String, StatusRule>);

impl StatusTransitionTable {
    pub fn new(rules: impl IntoIterator<Item = (&'static str, StatusRule)>) -> Self {
        Self(
            rules
                .into_iter()
                .map(|(status, rule)| (status.to_string(), rule))
                .collect(),
        )
    }

    pub fn rule(&self, status: &str) -> Option<&StatusRule> {
        self.0.get(status)
    }

    pub fn statuses(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Whether `role` may move a document from `current` to `target`.
    pub fn permits(&self, current: &str, target: &str, role: &str) -> bool {
        self.rule(current)
            .and_then(|rule| rule.next_status.get(target))
            .is_some_and(|roles| roles.contains(role))
    }
}

fn forbidden(resource_type: &str, current: &str) -> StatusError {
    StatusError::Forbidden(format!(
        "Can't update {resource_type} in current ({current}) status"
    ))
}

/// Checks a requested status change.
///
/// No request, or a request for the current status, always passes.
pub fn check_transition(
    resource_type: &str,
    current: &str,
    requested: Option<&str>,
    role: &str,
    table: &StatusTransitionTable,
) -> StatusResult<()> {
    let Some(requested) = requested.filter(|s| !s.is_empty() && *s != current) else {
        return Ok(());
    };
    if table.permits(current, requested, role) {
        Ok(())
    } else {
        tracing::debug!(resource_type, current, requested, role, "status transition refused");
        Err(forbidden(resource_type, current))
    }
}

/// Fails for any change to a document in a terminal status.
pub fn check_terminated(
    resource_type: &str,
    current: &str,
    terminal: &BTreeSet<String>,
) -> StatusResult<()> {
    if terminal.contains(current) {
        return Err(forbidden(resource_type, current));
    }
    Ok(())
}

/// Fails when `role` may not edit a document in `current` status.
pub fn check_editing(
    resource_type: &str,
    current: &str,
    role: &str,
    table: &StatusTransitionTable,
) -> StatusResult<()> {
    match table.rule(current) {
        Some(rule) if rule.editing_roles.contains(role) => Ok(()),
        _ => Err(forbidden(resource_type, current)),
    }
}
