//! Document model for the registry API.
//!
//! Schemas are plain data: a [`DocumentSchema`] lists its fields
//! ([`FieldSpec`]), cross-field [`Rule`]s and a [`RoleVisibilityTable`].
//! A [`SchemaRegistry`] holds every schema plus the [`Catalogs`] that back
//! choice lists, and is built once at startup.
//!
//! On top of the registry:
//! - [`Validator`] converts and checks a JSON body, collecting every field
//!   error into [`FieldErrors`]
//! - [`Serializer`] projects a document onto the fields a role may see
//! - [`ValidationPipeline`] ties both to the patch engine for create and edit
//!   requests
//! - [`status`] gates lifecycle status changes

mod catalog;
mod context;
mod error;
mod field;
mod ocds;
mod pipeline;
mod roles;
mod schema;
mod serializer;
pub mod status;
mod validate;

pub use catalog::{CatalogList, Catalogs};
pub use context::{RootContext, ADMINISTRATOR, CREATE_ROLE, EDIT_ROLE};
pub use error::{ModelError, ModelResult};
pub use field::{Choices, DefaultValue, FieldKind, FieldSpec};
pub use ocds::builtin_schemas;
pub use pipeline::{validate_json_data, PipelineError, ValidationPipeline};
pub use roles::{FieldFilter, RoleVisibilityTable};
pub use schema::{DocumentSchema, Rule, SchemaRegistry};
pub use serializer::Serializer;
pub use status::{StatusError, StatusRule, StatusTransitionTable};
pub use validate::{FieldError, FieldErrors, Validator};

/// Key of the internal parent back-reference. Never serialized.
pub const PARENT_KEY: &str = "__parent__";
