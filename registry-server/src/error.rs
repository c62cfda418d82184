//! API error envelope.
//!
//! Every failure leaves the server as
//! `{"status": <code>, "errors": [{"location", "name", "description"}, ...]}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use registry_crypto::CryptoError;
use registry_model::status::StatusError;
use registry_model::{FieldError, ModelError, PipelineError};
use registry_patch::PatchError;
use registry_storage::StorageError;
use serde::Serialize;
use serde_json::{json, Value};

/// Part of the request an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Body,
    Url,
    Querystring,
    Header,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEntry {
    pub location: Location,
    pub name: String,
    pub description: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: StatusCode,
    pub errors: Vec<ErrorEntry>,
    role: Option<String>,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(status: StatusCode, location: Location, name: &str, description: impl Into<Value>) -> Self {
        Self {
            status,
            errors: vec![ErrorEntry {
                location,
                name: name.to_string(),
                description: description.into(),
            }],
            role: None,
        }
    }

    pub fn not_found(name: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, Location::Url, name, "Not Found")
    }

    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, Location::Url, "permission", "Forbidden")
    }

    pub fn offset_invalid() -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            Location::Querystring,
            "offset",
            "Offset expired/invalid",
        )
    }

    /// A refused operation on the document body.
    pub fn operation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, Location::Body, "data", message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            Location::Body,
            "data",
            message.into(),
        )
    }

    /// Records the caller's role for the error log line.
    #[must_use]
    pub fn for_role(mut self, role: &str) -> Self {
        self.role.get_or_insert_with(|| role.to_string());
        self
    }

    fn body(&self) -> Value {
        json!({
            "status": self.status.as_u16(),
            "errors": self.errors,
        })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = self.body();
        tracing::info!(
            message_id = "error_handler",
            status = self.status.as_u16(),
            role = self.role.as_deref().unwrap_or(""),
            errors = %body["errors"],
            "Error on processing request"
        );
        (self.status, Json(body)).into_response()
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Malformed(message) => Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                Location::Body,
                "data",
                message,
            ),
            PipelineError::Validation(errors) => Self {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                errors: errors
                    .into_inner()
                    .into_iter()
                    .map(|(name, error)| ErrorEntry {
                        location: Location::Body,
                        name,
                        description: field_description(error),
                    })
                    .collect(),
                role: None,
            },
            PipelineError::ForbiddenRole(_) => {
                Self::new(StatusCode::FORBIDDEN, Location::Url, "role", "Forbidden")
            }
            PipelineError::Model(err) => err.into(),
        }
    }
}

fn field_description(error: FieldError) -> Value {
    serde_json::to_value(error).unwrap_or(Value::Null)
}

impl From<StatusError> for ApiError {
    fn from(err: StatusError) -> Self {
        match err {
            StatusError::Forbidden(message) => Self::operation(message),
        }
    }
}

impl From<PatchError> for ApiError {
    fn from(err: PatchError) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            Location::Body,
            "data",
            err.to_string(),
        )
    }
}

impl From<CryptoError> for ApiError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::InvalidOffset | CryptoError::Decryption(_) => Self::offset_invalid(),
            CryptoError::Encryption(message) => Self::internal(message),
        }
    }
}

impl From<ModelError> for ApiError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::UnknownRole { .. } => {
                Self::new(StatusCode::FORBIDDEN, Location::Url, "role", "Forbidden")
            }
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::RevisionConflict { .. } => Self::new(
                StatusCode::CONFLICT,
                Location::Body,
                "data",
                "Conflict on document update",
            ),
            other => {
                tracing::error!(error = %other, "document store failure");
                Self::internal("Internal server error")
            }
        }
    }
}
