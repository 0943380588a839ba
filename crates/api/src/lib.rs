pub mod config;
pub mod error;
pub mod handlers;
pub mod telemetry;
pub mod templates;
pub mod upload;

#[cfg(test)]
mod tests;

pub use config::AppConfig;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use extract::EntityAnalyzer;
use store::DocumentStore;
use tower_http::trace::TraceLayer;

/// Shared by every handler; built once at startup.
pub struct AppState {
    pub analyzer: EntityAnalyzer,
    pub store: DocumentStore,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Opens the store and prepares the upload directory described by `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.upload_dir).with_context(|| {
            format!("Failed to create upload directory {}", config.upload_dir.display())
        })?;

        let store = DocumentStore::open(&config.database_path).with_context(|| {
            format!("Failed to open database at {}", config.database_path.display())
        })?;

        Ok(Self {
            analyzer: EntityAnalyzer::from_config(config.model.clone()),
            store,
            upload_dir: config.upload_dir.clone(),
            max_upload_bytes: config.max_upload_bytes,
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::new()
        .route("/", get(handlers::index::upload_form))
        .route("/health", get(handlers::index::health))
        .route("/upload", post(handlers::documents::upload_document))
        .route("/result/:document_id", get(handlers::documents::show_result))
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
