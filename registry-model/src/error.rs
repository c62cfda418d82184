use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

/// Errors in schema metadata or its use.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("unknown schema: {0}")]
    UnknownSchema(String),

    #[error("role '{role}' is not defined for {schema}")]
    UnknownRole { schema: String, role: String },

    #[error("{schema}.{field} refers to unknown schema {target}")]
    UnresolvedModel {
        schema: String,
        field: String,
        target: String,
    },

    #[error("invalid regex '{pattern}': {reason}")]
    InvalidRegex { pattern: String, reason: String },

    #[error("invalid catalog data: {0}")]
    Catalog(String),
}
