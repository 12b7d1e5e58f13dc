use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::entities::structure_history;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct StructureNameRequest {
    pub structure_name: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct StructureIdRequest {
    pub structure_id: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A history entry as exposed over HTTP.
#[derive(Serialize, Debug)]
pub struct StructureHistoryEntry {
    #[serde(rename = "_id")]
    pub id: String,
    pub collection_name: String,
    pub is_current: bool,
    pub created_at: DateTime<Utc>,
}

impl From<structure_history::Model> for StructureHistoryEntry {
    fn from(model: structure_history::Model) -> Self {
        Self {
            id: model.id,
            collection_name: model.collection_name,
            is_current: model.is_current,
            created_at: model.created_at,
        }
    }
}
