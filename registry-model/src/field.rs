use crate::catalog::CatalogList;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The type of a schema field and its kind-specific constraints.
///
/// Serialized with a `type` tag so schemas can be written as JSON or TOML:
/// `{"type": "string", "max_length": 3}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    String {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_length: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_length: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        regex: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        choices: Option<Choices>,
    },
    Float {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
    },
    Int,
    Bool,
    DateTime,
    Url,
    Email,
    /// 32 hex digits.
    Md5,
    /// `algorithm:hexdigest`.
    Hash,
    Any,
    /// A nested object validated against another schema.
    Model { schema: String },
    List { item: Box<FieldKind> },
    /// A free-form object.
    Dict,
}

impl FieldKind {
    /// An unconstrained string.
    pub fn string() -> Self {
        Self::String {
            min_length: None,
            max_length: None,
            regex: None,
            choices: None,
        }
    }

    /// Name of the nested schema, for `Model` and lists of `Model`.
    pub fn nested_schema(&self) -> Option<&str> {
        match self {
            Self::Model { schema } => Some(schema),
            Self::List { item } => item.nested_schema(),
            _ => None,
        }
    }
}

/// Allowed values for a string field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Choices {
    Values(Vec<String>),
    /// Resolved against the registry's catalogs at validation time.
    Catalog(CatalogList),
}

/// Value filled in for a missing field on the create path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DefaultValue {
    Value(Value),
    GeneratedId,
    Now,
    EmptyList,
}

/// One field of a [`DocumentSchema`](crate::DocumentSchema).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
}

impl FieldSpec {
    pub fn new(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            default: None,
        }
    }

    /// Shorthand for an unconstrained string field.
    pub fn string(name: &str) -> Self {
        Self::new(name, FieldKind::string())
    }

    /// Shorthand for a string field limited to `choices`.
    pub fn choice(name: &str, choices: Choices) -> Self {
        Self::new(
            name,
            FieldKind::String {
                min_length: None,
                max_length: None,
                regex: None,
                choices: Some(choices),
            },
        )
    }

    /// Shorthand for a string field matching `pattern`.
    pub fn pattern(name: &str, pattern: &str) -> Self {
        Self::new(
            name,
            FieldKind::String {
                min_length: None,
                max_length: None,
                regex: Some(pattern.into()),
                choices: None,
            },
        )
    }

    /// Shorthand for a string field with length bounds.
    pub fn sized(name: &str, min_length: Option<usize>, max_length: Option<usize>) -> Self {
        Self::new(
            name,
            FieldKind::String {
                min_length,
                max_length,
                regex: None,
                choices: None,
            },
        )
    }

    pub fn float(name: &str, min: Option<f64>) -> Self {
        Self::new(name, FieldKind::Float { min })
    }

    pub fn int(name: &str) -> Self {
        Self::new(name, FieldKind::Int)
    }

    pub fn bool(name: &str) -> Self {
        Self::new(name, FieldKind::Bool)
    }

    pub fn datetime(name: &str) -> Self {
        Self::new(name, FieldKind::DateTime)
    }

    pub fn url(name: &str) -> Self {
        Self::new(name, FieldKind::Url)
    }

    pub fn email(name: &str) -> Self {
        Self::new(name, FieldKind::Email)
    }

    pub fn md5(name: &str) -> Self {
        Self::new(name, FieldKind::Md5)
    }

    pub fn hash(name: &str) -> Self {
        Self::new(name, FieldKind::Hash)
    }

    pub fn any(name: &str) -> Self {
        Self::new(name, FieldKind::Any)
    }

    /// Shorthand for a nested object field.
    pub fn model(name: &str, schema: &str) -> Self {
        Self::new(
            name,
            FieldKind::Model {
                schema: schema.into(),
            },
        )
    }

    /// Shorthand for a list of nested objects.
    pub fn model_list(name: &str, schema: &str) -> Self {
        Self::list(
            name,
            FieldKind::Model {
                schema: schema.into(),
            },
        )
    }

    pub fn list(name: &str, item: FieldKind) -> Self {
        Self::new(
            name,
            FieldKind::List {
                item: Box::new(item),
            },
        )
    }

    pub fn dict(name: &str) -> Self {
        Self::new(name, FieldKind::Dict)
    }

    /// Marks the field as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }
}
