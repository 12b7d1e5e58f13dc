use chrono::Local;
use sea_orm::TransactionTrait;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::db::services as db_services;
use crate::db::entities::structure_history;
use crate::parser;
use crate::web::{AppError, AppState};

const WORKBOOK_EXTENSION: &str = ".xlsx";

/// `"<prefix> YYYY-MM-DD HH:MM:SS.ffffff"` in local time.
pub fn new_collection_name(prefix: &str) -> String {
    format!("{prefix} {}", Local::now().format("%Y-%m-%d %H:%M:%S%.6f"))
}

/// Parses an uploaded workbook, stores it as the new current structure and
/// tells the parser server. Returns the collection name it was stored under.
pub async fn publish_workbook(
    state: &AppState,
    file_name: &str,
    bytes: Vec<u8>,
) -> Result<String, AppError> {
    if !file_name.ends_with(WORKBOOK_EXTENSION) {
        return Err(AppError::UnsupportedFile);
    }

    let documents = tokio::task::spawn_blocking(move || parser::parse_workbook(&bytes))
        .await?
        .map_err(|e| {
            warn!(file = file_name, error = %e, "Rejected workbook.");
            e
        })?;

    let collection_name = new_collection_name(&state.config.collection_prefix);
    let txn = state.db_pool.begin().await?;
    let stored =
        db_services::insert_structure_documents(&txn, &collection_name, documents).await?;
    db_services::record_current_structure(&txn, &collection_name).await?;
    txn.commit().await?;

    info!(
        file = file_name,
        collection = %collection_name,
        documents = stored,
        "Stored new current structure."
    );

    notify(state).await?;
    Ok(collection_name)
}

/// Makes an existing structure current and tells the parser server.
pub async fn switch_current_structure(
    state: &AppState,
    structure_id: &str,
) -> Result<structure_history::Model, AppError> {
    let id = Uuid::parse_str(structure_id.trim())
        .map_err(|e| AppError::InvalidInput(format!("Invalid structure id '{structure_id}': {e}")))?;

    let txn = state.db_pool.begin().await?;
    let Some(entry) = db_services::set_current_structure(&txn, &id.to_string()).await? else {
        txn.rollback().await?;
        return Err(AppError::NotFound("No structure found".to_string()));
    };
    txn.commit().await?;

    info!(structure_id = %entry.id, collection = %entry.collection_name, "Switched current structure.");

    notify(state).await?;
    Ok(entry)
}

async fn notify(state: &AppState) -> Result<(), AppError> {
    state.notifier.notify_structure_updated().await.map_err(|e| {
        error!(error = %e, "Failed to notify parser server of structure change.");
        AppError::from(e)
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_name_format() {
        let name = new_collection_name("CCSDS_Structure");
        let stamp = name.strip_prefix("CCSDS_Structure ").unwrap();
        assert!(chrono::NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S%.6f").is_ok());
        assert_eq!(stamp.len(), "2024-01-01 00:00:00.000000".len());
    }
}
