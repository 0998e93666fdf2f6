use thiserror::Error;

use crate::columns::ColumnRef;

/// A column id was looked up that the catalog did not resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("column {id} not found")]
pub struct ColumnNotFoundError {
    pub id: ColumnRef,
}

impl ColumnNotFoundError {
    pub const fn new(id: ColumnRef) -> Self {
        Self { id }
    }
}

/// Failures raised by a column catalog itself, as opposed to ids it does not know.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("column catalog unavailable: {0}")]
    Unavailable(String),
    #[error("column catalog error: {0}")]
    Other(String),
}
