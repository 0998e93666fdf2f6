use serde::{Deserialize, Serialize};

use crate::database::IdType;

/// Settings of an in-memory table.
///
/// - `id_type` picks how row ids are generated.
/// - `id_key` is the record key holding the row id.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TableConfig {
    pub id_type: IdType,
    pub id_key: String,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self { id_type: IdType::default(), id_key: "id".to_string() }
    }
}

impl TableConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from(id_type: IdType, id_key: &str) -> Self {
        Self { id_type, id_key: id_key.to_string() }
    }

    pub fn int(id_key: &str) -> Self {
        Self::from(IdType::Int, id_key)
    }

    pub fn uuid(id_key: &str) -> Self {
        Self::from(IdType::Uuid, id_key)
    }

    pub fn none(id_key: &str) -> Self {
        Self::from(IdType::None, id_key)
    }
}
