#![allow(dead_code)]

use registry_server::config::ApiUser;
use registry_server::{build_router, AppState, Settings};
use registry_storage::SqliteStore;
use serde_json::{json, Value};
use std::sync::Arc;

pub const BROKER: &str = "broker-key";
pub const OTHER_BROKER: &str = "other-broker-key";
pub const CONCIERGE: &str = "concierge-key";
pub const ADMIN: &str = "admin-key";

fn user(name: &str, key: &str, group: &str) -> ApiUser {
    ApiUser {
        name: name.into(),
        key: key.into(),
        group: group.into(),
    }
}

pub fn settings() -> Settings {
    let mut settings = Settings::default();
    settings.server_id = "test-server".into();
    settings.auth.users = vec![
        user("broker", BROKER, "brokers"),
        user("broker2", OTHER_BROKER, "brokers"),
        user("concierge", CONCIERGE, "concierge"),
        user("admin", ADMIN, "Administrator"),
    ];
    settings
}

pub fn state() -> Arc<AppState> {
    let store = SqliteStore::open_in_memory("registry").unwrap();
    Arc::new(AppState::new(settings(), Arc::new(store)).unwrap())
}

/// Spin up the HTTP server on an OS-assigned port, returning the API base URL.
pub async fn spawn_test_server(state: Arc<AppState>) -> String {
    let prefix = state.settings.route_prefix();
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://127.0.0.1:{port}{prefix}")
}

pub fn asset_data() -> Value {
    json!({
        "title": "Land plot",
        "assetCustodian": {
            "name": "State Property Fund",
            "identifier": {"scheme": "UA-EDR", "id": "00037256"},
            "address": {"countryName": "Україна"},
            "contactPoint": {"name": "Desk", "telephone": "+380440000000"}
        },
        "classification": {"scheme": "CAV", "id": "39513200-3", "description": "Cartons"},
        "value": {"amount": 100}
    })
}

pub fn document_data(title: &str, url: &str) -> Value {
    json!({
        "title": title,
        "url": url,
        "format": "application/pdf",
        "documentType": "notice"
    })
}
