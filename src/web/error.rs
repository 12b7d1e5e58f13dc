use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::notifications::NotifyError;
use crate::parser::WorkbookError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Only .xlsx files are supported")]
    UnsupportedFile,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Upload too large: {0}")]
    PayloadTooLarge(String),
    #[error("Not Found: {0}")]
    NotFound(String),
    #[error("Error parsing Excel: {0}")]
    Parse(#[from] WorkbookError),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Error in notifying structure change in parser server: {0}")]
    Notification(#[from] NotifyError),
    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, key) = match &self {
            AppError::UnsupportedFile | AppError::InvalidInput(_) => {
                (StatusCode::BAD_REQUEST, "detail")
            }
            AppError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "detail"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "error"),
            AppError::Parse(_)
            | AppError::DatabaseError(_)
            | AppError::Notification(_)
            | AppError::InternalServerError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "detail"),
        };
        let message = match self {
            AppError::InvalidInput(msg) | AppError::NotFound(msg) => msg,
            other => other.to_string(),
        };
        (status, Json(serde_json::json!({ key: message }))).into_response()
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::InternalServerError(format!("Background task failed: {err}"))
    }
}
