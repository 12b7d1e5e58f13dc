use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde_json::Value;
use uuid::Uuid;

use crate::db::entities::structure_document;
use crate::parser::StructureDocument;

// Keeps every statement well under SQLite's bound-parameter limit.
const INSERT_CHUNK_SIZE: usize = 500;

/// Stores the documents of one structure, keeping their order.
pub async fn insert_structure_documents<C: ConnectionTrait>(
    conn: &C,
    collection_name: &str,
    documents: Vec<StructureDocument>,
) -> Result<usize, DbErr> {
    let total = documents.len();
    let mut models: Vec<structure_document::ActiveModel> = documents
        .into_iter()
        .enumerate()
        .map(|(position, document)| structure_document::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            collection_name: Set(collection_name.to_owned()),
            position: Set(position as i32),
            document: Set(Value::Object(document)),
        })
        .collect();

    while !models.is_empty() {
        let rest = models.split_off(models.len().min(INSERT_CHUNK_SIZE));
        structure_document::Entity::insert_many(models)
            .exec_without_returning(conn)
            .await?;
        models = rest;
    }

    Ok(total)
}

/// Returns the documents of a structure in upload order, each led by its `_id`.
pub async fn find_structure_documents(
    db: &DatabaseConnection,
    collection_name: &str,
) -> Result<Vec<StructureDocument>, DbErr> {
    let rows = structure_document::Entity::find()
        .filter(structure_document::Column::CollectionName.eq(collection_name))
        .order_by_asc(structure_document::Column::Position)
        .all(db)
        .await?;

    Ok(rows.into_iter().map(with_id).collect())
}

fn with_id(model: structure_document::Model) -> StructureDocument {
    let mut document = StructureDocument::new();
    document.insert("_id".to_string(), Value::String(model.id));
    if let Value::Object(fields) = model.document {
        document.extend(fields);
    }
    document
}
