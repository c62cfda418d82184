use crate::error::{ModelError, ModelResult};
use crate::PARENT_KEY;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Which top-level fields a role may see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "fields", rename_all = "snake_case")]
pub enum FieldFilter {
    Whitelist(BTreeSet<String>),
    Blacklist(BTreeSet<String>),
}

impl FieldFilter {
    pub fn whitelist(fields: &[&str]) -> Self {
        Self::Whitelist(fields.iter().map(|f| (*f).to_string()).collect())
    }

    pub fn blacklist(fields: &[&str]) -> Self {
        Self::Blacklist(fields.iter().map(|f| (*f).to_string()).collect())
    }

    /// A filter that lets every field through.
    pub fn wholelist() -> Self {
        Self::Blacklist(BTreeSet::new())
    }

    /// Whether `field` is visible. The parent link never is.
    pub fn allows(&self, field: &str) -> bool {
        if field == PARENT_KEY {
            return false;
        }
        match self {
            Self::Whitelist(fields) => fields.contains(field),
            Self::Blacklist(fields) => !fields.contains(field),
        }
    }
}

/// Role name → field filter for one document type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleVisibilityTable {
    pub roles: BTreeMap<String, FieldFilter>,
    /// Use the `default` role when a top-level lookup misses.
    #[serde(default)]
    pub fallback_to_default: bool,
}

pub const DEFAULT_ROLE: &str = "default";

impl RoleVisibilityTable {
    pub fn new(roles: impl IntoIterator<Item = (&'static str, FieldFilter)>) -> Self {
        Self {
            roles: roles
                .into_iter()
                .map(|(name, filter)| (name.to_string(), filter))
                .collect(),
            fallback_to_default: false,
        }
    }

    #[must_use]
    pub fn with_fallback(mut self) -> Self {
        self.fallback_to_default = true;
        self
    }

    /// Whether `role` is declared for this type.
    pub fn contains(&self, role: &str) -> bool {
        self.roles.contains_key(role)
    }

    /// Filter for a document serialized at the top level.
    pub fn resolve(&self, schema: &str, role: &str) -> ModelResult<&FieldFilter> {
        self.roles
            .get(role)
            .or_else(|| {
                self.fallback_to_default
                    .then(|| self.roles.get(DEFAULT_ROLE))
                    .flatten()
            })
            .ok_or_else(|| unknown_role(schema, role))
    }

    /// Filter for a document embedded in a parent serialized under `role`.
    pub fn resolve_nested(&self, schema: &str, role: &str) -> ModelResult<&FieldFilter> {
        self.roles
            .get(role)
            .or_else(|| self.roles.get(DEFAULT_ROLE))
            .ok_or_else(|| unknown_role(schema, role))
    }
}

fn unknown_role(schema: &str, role: &str) -> ModelError {
    ModelError::UnknownRole {
        schema: schema.to_string(),
        role: role.to_string(),
    }
}
