//! Content endpoints.

use crate::error::ApiError;
use crate::{AppState, RequireAdmin};
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Json, Response};
use folio_content::{ContentStatus, ContentUpdate};
use folio_types::{SectionName, Timestamp};
use serde_json::{json, Value};
use tracing::info;

pub(crate) async fn get_content(State(state): State<AppState>) -> Json<Value> {
    let content = state.engine.store().content().await;
    Json((*content).clone())
}

pub(crate) async fn get_section(
    State(state): State<AppState>,
    Path(section): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let section: SectionName = section
        .parse()
        .map_err(|_| ApiError::NotFound(format!("Unknown section {section}")))?;
    state
        .engine
        .store()
        .section(section)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Section {section} has no content")))
}

pub(crate) async fn get_status(State(state): State<AppState>) -> Json<ContentStatus> {
    Json(state.engine.store().status().await)
}

pub(crate) async fn apply_updates(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Json(updates): Json<Vec<ContentUpdate>>,
) -> Result<Json<Value>, ApiError> {
    let count = updates.len();
    state.engine.store().update_multiple(updates).await?;
    info!("Applied {} content updates", count);
    let status = state.engine.store().status().await;
    Ok(Json(json!({ "success": true, "status": status })))
}

pub(crate) async fn save(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    if !state.engine.save_to_remote().await {
        return Err(ApiError::Upstream("Failed to save content".to_string()));
    }
    let status = state.engine.store().status().await;
    Ok(Json(json!({ "success": true, "status": status })))
}

pub(crate) async fn reset(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    if !state.engine.reset_content().await {
        return Err(ApiError::Upstream(
            "Content was reset locally but could not be saved".to_string(),
        ));
    }
    Ok(Json(json!({ "success": true })))
}

pub(crate) async fn export(State(state): State<AppState>) -> Result<Response, ApiError> {
    let body = state
        .engine
        .export_data()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let stamp = Timestamp::now().to_iso8601();
    let date = stamp.split('T').next().unwrap_or_default();
    let disposition = format!("attachment; filename=\"portfolio-content-{date}.json\"");
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

pub(crate) async fn import(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    body: String,
) -> Result<Json<Value>, ApiError> {
    state.engine.import_data(&body).await?;
    let status = state.engine.store().status().await;
    Ok(Json(json!({ "success": true, "status": status })))
}
