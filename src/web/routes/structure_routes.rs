use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tracing::info;

use crate::db::services;
use crate::parser::StructureDocument;
use crate::services::structure_service;
use crate::web::models::{
    MessageResponse, StructureHistoryEntry, StructureIdRequest, StructureNameRequest,
};
use crate::web::{AppError, AppState};

const UPLOAD_FIELD: &str = "file";

fn upload_error(context: &str, err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::InvalidInput(format!("{context}: {err}"))
    }
}

async fn upload_excel_handler(
    State(app_state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<MessageResponse>, AppError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| upload_error("Malformed upload", e))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| upload_error("Failed to read upload", e))?;
        upload = Some((file_name, bytes.to_vec()));
        break;
    }

    let (file_name, bytes) =
        upload.ok_or_else(|| AppError::InvalidInput("Missing 'file' field".to_string()))?;
    info!(file = %file_name, size = bytes.len(), "Received workbook upload.");

    structure_service::publish_workbook(&app_state, &file_name, bytes).await?;
    Ok(Json(MessageResponse::new("File processed successfully")))
}

async fn get_current_structure_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<StructureDocument>>, AppError> {
    let current = services::find_current_structure(&app_state.db_pool)
        .await?
        .ok_or_else(|| AppError::NotFound("No current structure found".to_string()))?;
    let documents =
        services::find_structure_documents(&app_state.db_pool, &current.collection_name).await?;
    Ok(Json(documents))
}

async fn get_all_structure_metadata_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<StructureHistoryEntry>>, AppError> {
    let history = services::list_structure_history(&app_state.db_pool).await?;
    if history.is_empty() {
        return Err(AppError::NotFound("No structure found".to_string()));
    }
    Ok(Json(history.into_iter().map(StructureHistoryEntry::from).collect()))
}

async fn get_structure_by_name_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<StructureNameRequest>,
) -> Result<Json<Vec<StructureDocument>>, AppError> {
    let documents =
        services::find_structure_documents(&app_state.db_pool, &payload.structure_name).await?;
    if documents.is_empty() {
        return Err(AppError::NotFound("No structure found".to_string()));
    }
    Ok(Json(documents))
}

async fn change_current_structure_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<StructureIdRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    structure_service::switch_current_structure(&app_state, &payload.structure_id).await?;
    Ok(Json(MessageResponse::new("Current structure changed successfully")))
}

/// The structure API. Route names match what existing clients already call.
pub fn create_structure_router(max_upload_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/uploadExcel",
            post(upload_excel_handler).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/getCurrentStructure", get(get_current_structure_handler))
        .route("/getAllStructureMetadata", get(get_all_structure_metadata_handler))
        .route("/getStructureByName", post(get_structure_by_name_handler))
        .route("/changeCurrentStructure", post(change_current_structure_handler))
}
