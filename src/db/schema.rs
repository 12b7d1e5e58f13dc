use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, Schema};
use tracing::{debug, error};

use crate::db::entities::{structure_document, structure_history};

/// Partial unique index: the database itself refuses a second current entry.
const SINGLE_CURRENT_INDEX: &str = "CREATE UNIQUE INDEX IF NOT EXISTS \
     idx_structure_history_single_current ON structure_history (is_current) WHERE is_current";

/// Creates the tables and their indexes when they are missing.
pub async fn ensure_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    create_table(db, structure_history::Entity).await?;
    create_table(db, structure_document::Entity).await?;
    db.execute_unprepared(SINGLE_CURRENT_INDEX).await.map_err(|e| {
        error!(error = %e, "Failed to create the single-current index.");
        e
    })?;
    Ok(())
}

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut table = schema.create_table_from_entity(entity);
    table.if_not_exists();
    db.execute(backend.build(&table)).await.map_err(|e| {
        error!(table = entity.table_name(), error = %e, "Failed to create table.");
        e
    })?;

    for mut index in schema.create_index_from_entity(entity) {
        index.if_not_exists();
        db.execute(backend.build(&index)).await?;
    }

    debug!(table = entity.table_name(), "Table is in place.");
    Ok(())
}
