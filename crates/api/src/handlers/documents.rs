use std::sync::Arc;

use anyhow::Context;
use askama::Template;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use extract::EntityRecord;
use ingest::DocumentFormat;
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::templates::ResultPage;
use crate::upload::{read_document_field, sanitize_filename};
use crate::AppState;

/// `POST /upload`: save, extract, analyze, persist, then redirect to the result page.
pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let multipart = multipart.map_err(|_| ApiError::NoFilePart)?;
    let upload = read_document_field(multipart).await?;

    if upload.filename.is_empty() {
        return Err(ApiError::NoSelectedFile);
    }
    if DocumentFormat::from_filename(&upload.filename).is_none() {
        return Err(ApiError::UnsupportedFileType);
    }
    let filename = sanitize_filename(&upload.filename);
    if filename.is_empty() {
        return Err(ApiError::NoSelectedFile);
    }

    let path = state.upload_dir.join(&filename);
    tokio::fs::write(&path, &upload.data)
        .await
        .with_context(|| format!("Failed to save upload to {}", path.display()))?;
    info!(filename = %filename, bytes = upload.data.len(), "Saved upload");

    let extraction = tokio::task::spawn_blocking(move || ingest::extract_text(&path))
        .await
        .context("Text extraction task panicked")?
        .context("Text extraction failed")?;
    if let Some(reason) = extraction.failure() {
        warn!(filename = %filename, reason, "Text extraction degraded to empty text");
    }
    let text = extraction.into_text();
    debug!(chars = text.len(), "Extracted text");

    let analysis = state.analyzer.analyze_text(&text).await;
    if let Some(failure) = analysis.failure() {
        warn!(filename = %filename, error = %failure, "Entity analysis degraded to no entities");
    }
    let entities = analysis.into_entities();
    let entity_count = entities.len();

    let store = state.store.clone();
    let document_id = tokio::task::spawn_blocking(move || store.create(&filename, &text, &entities))
        .await
        .context("Database task panicked")?
        .context("Database error")?;
    info!(document_id, entities = entity_count, "Document stored");

    let location = format!("/result/{document_id}");
    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}

/// `GET /result/:document_id`: render the stored entities of one document.
pub async fn show_result(
    State(state): State<Arc<AppState>>,
    Path(document_id): Path<String>,
) -> Result<Html<String>, ApiError> {
    let id: i64 = document_id.parse().map_err(|_| ApiError::NotFound)?;

    let store = state.store.clone();
    let document = tokio::task::spawn_blocking(move || store.get(id))
        .await
        .context("Database task panicked")?
        .context("Database error")?
        .ok_or(ApiError::NotFound)?;

    let entities: Vec<EntityRecord> = document
        .entities_as()
        .context("Stored entities are not valid JSON")?;

    let page = ResultPage {
        filename: &document.filename,
        entities: &entities,
    };
    Ok(Html(page.render().context("Failed to render result page")?))
}
