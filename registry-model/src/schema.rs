use crate::catalog::Catalogs;
use crate::error::{ModelError, ModelResult};
use crate::field::{FieldKind, FieldSpec};
use crate::roles::RoleVisibilityTable;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A validation rule spanning several fields of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Rule {
    /// `start` must not be later than `end`. Reported on `start`.
    PeriodOrder { start: String, end: String },
    /// At least one of `target` and `others` must be non-empty. Reported on
    /// `target`.
    AtLeastOne {
        target: String,
        others: Vec<String>,
        message: String,
    },
    /// `code` must be one of the catalog codes of the scheme in `scheme`.
    CatalogCode { scheme: String, code: String },
}

/// Field list, rules and role table for one document type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSchema {
    pub name: String,
    pub fields: Vec<FieldSpec>,
    #[serde(default)]
    pub rules: Vec<Rule>,
    pub roles: RoleVisibilityTable,
}

impl DocumentSchema {
    pub fn new(name: &str, fields: Vec<FieldSpec>, roles: RoleVisibilityTable) -> Self {
        Self {
            name: name.into(),
            fields,
            rules: Vec::new(),
            roles,
        }
    }

    #[must_use]
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Replaces the field of the same name, or appends it.
    #[must_use]
    pub fn override_field(mut self, spec: FieldSpec) -> Self {
        match self.fields.iter_mut().find(|f| f.name == spec.name) {
            Some(slot) => *slot = spec,
            None => self.fields.push(spec),
        }
        self
    }

    /// Copy of this schema under another name.
    #[must_use]
    pub fn renamed(&self, name: &str) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }
}

/// Immutable collection of schemas and reference data.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, DocumentSchema>,
    catalogs: Catalogs,
    patterns: HashMap<String, Regex>,
}

impl SchemaRegistry {
    /// An empty registry over `catalogs`.
    pub fn new(catalogs: Catalogs) -> Self {
        Self {
            schemas: BTreeMap::new(),
            catalogs,
            patterns: HashMap::new(),
        }
    }

    /// Registry with every built-in schema and the given catalogs.
    pub fn builtin(catalogs: Catalogs) -> ModelResult<Self> {
        let mut registry = Self::new(catalogs);
        for schema in crate::ocds::builtin_schemas() {
            registry.register(schema)?;
        }
        registry.verify()?;
        Ok(registry)
    }

    /// Adds or replaces a schema, compiling its regex constraints.
    pub fn register(&mut self, schema: DocumentSchema) -> ModelResult<()> {
        for field in &schema.fields {
            if let FieldKind::String {
                regex: Some(pattern),
                ..
            } = &field.kind
            {
                if !self.patterns.contains_key(pattern) {
                    let compiled = Regex::new(pattern).map_err(|e| ModelError::InvalidRegex {
                        pattern: pattern.clone(),
                        reason: e.to_string(),
                    })?;
                    self.patterns.insert(pattern.clone(), compiled);
                }
            }
        }
        self.schemas.insert(schema.name.clone(), schema);
        Ok(())
    }

    /// Checks that every nested model reference resolves.
    pub fn verify(&self) -> ModelResult<()> {
        for schema in self.schemas.values() {
            for field in &schema.fields {
                if let Some(target) = field.kind.nested_schema() {
                    if !self.schemas.contains_key(target) {
                        return Err(ModelError::UnresolvedModel {
                            schema: schema.name.clone(),
                            field: field.name.clone(),
                            target: target.to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> ModelResult<&DocumentSchema> {
        self.schemas
            .get(name)
            .ok_or_else(|| ModelError::UnknownSchema(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn catalogs(&self) -> &Catalogs {
        &self.catalogs
    }

    /// Compiled form of a pattern registered with a schema.
    pub fn pattern(&self, pattern: &str) -> Option<&Regex> {
        self.patterns.get(pattern)
    }
}
