use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use tracing::info;

pub mod entities;
pub mod schema;
pub mod services;

/// Opens the connection pool and makes sure the tables exist.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(database_url.to_owned());
    opt.max_connections(10).sqlx_logging(false);
    connect_with(opt).await
}

pub async fn connect_with(opt: ConnectOptions) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(opt).await?;
    schema::ensure_schema(&db).await?;
    info!(backend = ?db.get_database_backend(), "Database ready.");
    Ok(db)
}

#[cfg(test)]
pub(crate) async fn memory_db() -> DatabaseConnection {
    // A single connection, otherwise every pooled connection gets its own in-memory database.
    let mut opt = ConnectOptions::new("sqlite::memory:".to_owned());
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    connect_with(opt).await.expect("in-memory sqlite")
}
