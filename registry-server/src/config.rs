//! Server settings, loaded once at startup from a TOML file.

use registry_model::{StatusRule, StatusTransitionTable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid settings: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Timezone(#[from] registry_types::Error),

    #[error(transparent)]
    Model(#[from] registry_model::ModelError),

    #[error("resource '{resource}' uses unknown schema '{schema}'")]
    UnknownSchema { resource: String, schema: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Identity the cursor key is derived from.
    pub server_id: String,
    pub listen: String,
    /// Routes live under `/api/<api_version>`.
    pub api_version: String,
    /// Base of absolute links in responses. Falls back to the `Host` header.
    pub public_url: Option<String>,
    /// Read listing views without waiting for index refresh.
    pub update_after: bool,
    /// Offset for timestamps that carry none, such as `+02:00`.
    pub timezone: String,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    /// JSON file replacing the built-in catalogs.
    pub catalogs: Option<PathBuf>,
    pub resources: Vec<ResourceSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_id: "registry".into(),
            listen: "127.0.0.1:6543".into(),
            api_version: "2.4".into(),
            public_url: None,
            update_after: true,
            timezone: "+02:00".into(),
            database: DatabaseSettings::default(),
            auth: AuthSettings::default(),
            catalogs: None,
            resources: vec![ResourceSettings::assets()],
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn resource(&self, name: &str) -> Option<&ResourceSettings> {
        self.resources.iter().find(|r| r.name == name)
    }

    pub fn route_prefix(&self) -> String {
        format!("/api/{}", self.api_version)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub path: PathBuf,
    /// Database name. Part of the cursor nonce.
    pub name: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("registry.sqlite"),
            name: "registry".into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub users: Vec<ApiUser>,
}

/// A client account. `key` is sent as the Basic-auth user name or as a
/// Bearer token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiUser {
    pub name: String,
    pub key: String,
    pub group: String,
}

/// One top-level resource exposed under `/api/<version>/<name>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSettings {
    pub name: String,
    pub schema: String,
    /// Role of a caller who owns the document and presents its token.
    pub owner_role: String,
    pub initial_status: String,
    #[serde(default)]
    pub create_groups: BTreeSet<String>,
    /// Body fields the listing view carries without loading documents.
    #[serde(default)]
    pub listing_fields: Vec<String>,
    #[serde(default)]
    pub terminal_statuses: BTreeSet<String>,
    #[serde(default)]
    pub statuses: StatusTransitionTable,
}

impl ResourceSettings {
    pub fn assets() -> Self {
        const OWNER: &str = "asset_owner";
        const ADMIN: &str = "Administrator";
        const CONCIERGE: &str = "concierge";
        Self {
            name: "assets".into(),
            schema: "Asset".into(),
            owner_role: OWNER.into(),
            initial_status: "draft".into(),
            create_groups: BTreeSet::from(["brokers".to_string()]),
            listing_fields: vec![
                "assetType".into(),
                "status".into(),
                "title".into(),
                "description".into(),
            ],
            terminal_statuses: BTreeSet::from(["deleted".to_string(), "complete".to_string()]),
            statuses: StatusTransitionTable::new([
                (
                    "draft",
                    StatusRule::new(&[OWNER, ADMIN])
                        .allow("pending", &[OWNER, ADMIN])
                        .allow("deleted", &[OWNER, ADMIN]),
                ),
                (
                    "pending",
                    StatusRule::new(&[OWNER, ADMIN, CONCIERGE])
                        .allow("active", &[CONCIERGE, ADMIN])
                        .allow("deleted", &[OWNER, ADMIN]),
                ),
                (
                    "active",
                    StatusRule::new(&[CONCIERGE, ADMIN])
                        .allow("complete", &[CONCIERGE, ADMIN])
                        .allow("pending", &[CONCIERGE, ADMIN]),
                ),
            ]),
        }
    }

    /// Singular name used in log event ids and URL error names.
    pub fn item_name(&self) -> &str {
        self.name.strip_suffix('s').unwrap_or(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_assets() {
        let settings = Settings::default();
        let assets = settings.resource("assets").unwrap();
        assert_eq!(assets.item_name(), "asset");
        assert!(assets.statuses.permits("draft", "pending", "asset_owner"));
        assert!(!assets.statuses.permits("draft", "active", "asset_owner"));
        assert_eq!(settings.route_prefix(), "/api/2.4");
    }

    #[test]
    fn toml_overrides_fields() {
        let settings = Settings::from_toml(
            r#"
            server_id = "srv"
            update_after = false

            [database]
            name = "assets-db"

            [[auth.users]]
            name = "broker"
            key = "broker-key"
            group = "brokers"

            [[resources]]
            name = "lots"
            schema = "Asset"
            owner_role = "lot_owner"
            initial_status = "draft"
            terminal_statuses = ["deleted"]

            [resources.statuses.draft]
            editing_roles = ["lot_owner"]
            next_status = { deleted = ["lot_owner"] }
            "#,
        )
        .unwrap();
        assert_eq!(settings.server_id, "srv");
        assert!(!settings.update_after);
        assert_eq!(settings.database.name, "assets-db");
        assert_eq!(settings.database.path, PathBuf::from("registry.sqlite"));
        assert_eq!(settings.auth.users[0].group, "brokers");
        let lots = settings.resource("lots").unwrap();
        assert!(lots.statuses.permits("draft", "deleted", "lot_owner"));
        assert!(settings.resource("assets").is_none());
    }
}
