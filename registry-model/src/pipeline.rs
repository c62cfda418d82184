//! Request body validation for create and edit requests.

use crate::context::{RootContext, CREATE_ROLE};
use crate::error::ModelError;
use crate::schema::SchemaRegistry;
use crate::serializer::Serializer;
use crate::validate::{FieldErrors, Validator};
use chrono::FixedOffset;
use registry_patch::apply_data_patch;
use serde_json::{Map, Value};
use thiserror::Error;

pub const DATA_NOT_AVAILABLE: &str = "Data not available";

#[derive(Debug, Clone, Error, PartialEq)]
pub enum PipelineError {
    /// Body is not JSON or lacks the `data` object.
    #[error("{0}")]
    Malformed(String),

    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    /// The role the result would be serialized under is not declared by the
    /// schema.
    #[error("role '{0}' is forbidden")]
    ForbiddenRole(String),

    #[error(transparent)]
    Model(#[from] ModelError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Extracts the `data` object from a request body.
pub fn validate_json_data(body: &[u8]) -> PipelineResult<Map<String, Value>> {
    let json: Value =
        serde_json::from_slice(body).map_err(|e| PipelineError::Malformed(e.to_string()))?;
    match json {
        Value::Object(mut envelope) => match envelope.remove("data") {
            Some(Value::Object(data)) => Ok(data),
            _ => Err(PipelineError::Malformed(DATA_NOT_AVAILABLE.into())),
        },
        _ => Err(PipelineError::Malformed(DATA_NOT_AVAILABLE.into())),
    }
}

/// Validates request data and serializes it under the role of the request.
#[derive(Debug, Clone, Copy)]
pub struct ValidationPipeline<'a> {
    registry: &'a SchemaRegistry,
    timezone: FixedOffset,
}

impl<'a> ValidationPipeline<'a> {
    pub fn new(registry: &'a SchemaRegistry, timezone: FixedOffset) -> Self {
        Self { registry, timezone }
    }

    /// Runs the create path when `existing` is `None`, the edit path
    /// otherwise.
    ///
    /// Create: defaults, validation, serialization under `create`.
    /// Edit: the submitted data is overlaid on `existing` with the patch
    /// engine, the merged document is validated without defaults and
    /// serialized under the context's edit role.
    pub fn validate_data(
        &self,
        schema: &str,
        data: &Map<String, Value>,
        existing: Option<&Map<String, Value>>,
        context: &RootContext,
    ) -> PipelineResult<Map<String, Value>> {
        let definition = self.registry.get(schema)?;
        let validator = Validator::new(self.registry, self.timezone);

        let (validated, role) = match existing {
            None => {
                let validated = validator
                    .validate(definition, data, true)
                    .map_err(PipelineError::Validation)?;
                (validated, CREATE_ROLE)
            }
            Some(initial) => {
                let patched = apply_data_patch(
                    &Value::Object(initial.clone()),
                    &Value::Object(data.clone()),
                )
                .map_err(|e| PipelineError::Validation(FieldErrors::single("data", e.to_string())))?;
                let merged = match patched {
                    Some(Value::Object(merged)) => merged,
                    Some(_) => {
                        return Err(PipelineError::Malformed(DATA_NOT_AVAILABLE.into()));
                    }
                    None => initial.clone(),
                };
                let validated = validator
                    .validate(definition, &merged, false)
                    .map_err(PipelineError::Validation)?;
                (validated, context.edit_role())
            }
        };

        if !definition.roles.contains(role) {
            tracing::debug!(schema, role, "role not declared for schema");
            return Err(PipelineError::ForbiddenRole(role.to_string()));
        }
        Ok(Serializer::new(self.registry).serialize(schema, &validated, role)?)
    }
}
