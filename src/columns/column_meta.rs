use serde::{Deserialize, Serialize};

use crate::columns::ColumnRef;

/// Resolved identity of a column: the client id and the name the record
/// store knows it by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct ColumnMeta {
    pub id: ColumnRef,
    pub name: String,
}

impl ColumnMeta {
    pub fn new(id: impl Into<ColumnRef>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}
