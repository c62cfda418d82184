use crate::config::{ConfigError, ResourceSettings, Settings};
use crate::error::{ApiError, ApiResult};
use chrono::FixedOffset;
use registry_crypto::CursorCodec;
use registry_model::{Catalogs, SchemaRegistry};
use registry_storage::DocumentStore;
use registry_types::parse_offset;
use std::sync::Arc;

/// Read-only snapshot shared by every request.
pub struct AppState {
    pub settings: Settings,
    pub registry: SchemaRegistry,
    pub store: Arc<dyn DocumentStore>,
    pub cursor: CursorCodec,
    pub timezone: FixedOffset,
}

impl AppState {
    pub fn new(settings: Settings, store: Arc<dyn DocumentStore>) -> Result<Self, ConfigError> {
        let catalogs = match &settings.catalogs {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.clone(),
                    source,
                })?;
                Catalogs::from_json(&raw)?
            }
            None => Catalogs::builtin(),
        };
        let registry = SchemaRegistry::builtin(catalogs)?;
        for resource in &settings.resources {
            if !registry.contains(&resource.schema) {
                return Err(ConfigError::UnknownSchema {
                    resource: resource.name.clone(),
                    schema: resource.schema.clone(),
                });
            }
        }
        let timezone = parse_offset(&settings.timezone)?;
        let cursor = CursorCodec::new(&settings.server_id, store.name());
        tracing::debug!(
            resources = settings.resources.len(),
            db = store.name(),
            "application state ready"
        );
        Ok(Self {
            settings,
            registry,
            store,
            cursor,
            timezone,
        })
    }

    pub fn resource(&self, name: &str) -> ApiResult<&ResourceSettings> {
        self.settings
            .resource(name)
            .ok_or_else(|| ApiError::not_found("resource"))
    }
}
