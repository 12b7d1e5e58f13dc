use chrono::Utc;
use sea_orm::{
    prelude::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend,
    DbErr, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set, TransactionTrait,
    UpdateResult,
};
use uuid::Uuid;

use crate::db::entities::structure_history;

/// Serializes writers of the current flag until the enclosing transaction ends.
/// SQLite already admits one writer at a time. Postgres needs the table lock,
/// otherwise a concurrent writer clears the flags before seeing our entry.
async fn lock_history<C: ConnectionTrait>(conn: &C) -> Result<(), DbErr> {
    if conn.get_database_backend() == DbBackend::Postgres {
        conn.execute_unprepared("LOCK TABLE structure_history IN SHARE ROW EXCLUSIVE MODE")
            .await?;
    }
    Ok(())
}

async fn clear_current<C: ConnectionTrait>(conn: &C) -> Result<UpdateResult, DbErr> {
    structure_history::Entity::update_many()
        .col_expr(structure_history::Column::IsCurrent, Expr::value(false))
        .filter(structure_history::Column::IsCurrent.eq(true))
        .exec(conn)
        .await
}

/// Adds a history entry for `collection_name` and makes it the only current one.
pub async fn record_current_structure<C: ConnectionTrait + TransactionTrait>(
    conn: &C,
    collection_name: &str,
) -> Result<structure_history::Model, DbErr> {
    let txn = conn.begin().await?;
    lock_history(&txn).await?;
    clear_current(&txn).await?;
    let entry = structure_history::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        collection_name: Set(collection_name.to_owned()),
        is_current: Set(true),
        created_at: Set(Utc::now()),
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;
    Ok(entry)
}

/// Makes the entry with `id` the current one. Returns `None` and leaves the
/// history untouched when no such entry exists.
pub async fn set_current_structure<C: ConnectionTrait + TransactionTrait>(
    conn: &C,
    id: &str,
) -> Result<Option<structure_history::Model>, DbErr> {
    let txn = conn.begin().await?;
    lock_history(&txn).await?;
    let Some(entry) = structure_history::Entity::find_by_id(id.to_owned())
        .one(&txn)
        .await?
    else {
        txn.rollback().await?;
        return Ok(None);
    };

    clear_current(&txn).await?;
    let mut active = entry.into_active_model();
    active.is_current = Set(true);
    let entry = active.update(&txn).await?;
    txn.commit().await?;
    Ok(Some(entry))
}

pub async fn find_current_structure(
    db: &DatabaseConnection,
) -> Result<Option<structure_history::Model>, DbErr> {
    structure_history::Entity::find()
        .filter(structure_history::Column::IsCurrent.eq(true))
        .order_by_desc(structure_history::Column::CreatedAt)
        .one(db)
        .await
}

/// All history entries, oldest first.
pub async fn list_structure_history(
    db: &DatabaseConnection,
) -> Result<Vec<structure_history::Model>, DbErr> {
    structure_history::Entity::find()
        .order_by_asc(structure_history::Column::CreatedAt)
        .order_by_asc(structure_history::Column::CollectionName)
        .all(db)
        .await
}
