//! HTTP API for the registry.
//!
//! Routes live under `/api/<version>`:
//!
//! | Route | Methods |
//! |-------|---------|
//! | `/{resource}` | `GET` listing, `POST` create |
//! | `/{resource}/{id}` | `GET`, `PATCH` |
//! | `/{resource}/{id}/documents` | `GET`, `POST` |
//! | `/{resource}/{id}/documents/{document_id}` | `GET`, `PUT`, `PATCH` |

pub mod auth;
pub mod config;
pub mod documents;
pub mod error;
pub mod listing;
pub mod resource;
pub mod state;

use axum::routing::get;
use axum::Router;
use std::sync::Arc;

pub use config::{ConfigError, Settings};
pub use error::{ApiError, ApiResult};
pub use state::AppState;

/// Build the HTTP API router over the given state.
pub fn build_router(state: Arc<AppState>) -> Router {
    let prefix = state.settings.route_prefix();
    Router::new()
        .route(
            &format!("{prefix}/{{resource}}"),
            get(resource::list_resources).post(resource::create_resource),
        )
        .route(
            &format!("{prefix}/{{resource}}/{{id}}"),
            get(resource::get_resource).patch(resource::patch_resource),
        )
        .route(
            &format!("{prefix}/{{resource}}/{{id}}/documents"),
            get(documents::list_documents).post(documents::create_document),
        )
        .route(
            &format!("{prefix}/{{resource}}/{{id}}/documents/{{document_id}}"),
            get(documents::get_document)
                .put(documents::put_document)
                .patch(documents::patch_document),
        )
        .with_state(state)
}
