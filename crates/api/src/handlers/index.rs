use std::sync::Arc;

use askama::Template;
use axum::extract::State;
use axum::response::Html;
use axum::Json;
use serde::Serialize;

use crate::error::ApiError;
use crate::templates::UploadPage;
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    database: String,
    documents: Option<u64>,
}

pub async fn upload_form() -> Result<Html<String>, ApiError> {
    let page = UploadPage.render().map_err(anyhow::Error::from)?;
    Ok(Html(page))
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let store = state.store.clone();
    let count = tokio::task::spawn_blocking(move || store.count()).await;

    let (database, documents) = match count {
        Ok(Ok(n)) => ("ok".to_string(), Some(n)),
        Ok(Err(e)) => (format!("error: {}", e), None),
        Err(e) => (format!("error: {}", e), None),
    };

    Json(HealthResponse { database, documents })
}
