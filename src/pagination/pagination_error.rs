use thiserror::Error;

use crate::{
    columns::{CatalogError, ColumnNotFoundError},
    grouping::GroupAnnotationError,
    storage::StorageError,
};

/// Everything that can make a `paginate` call fail. No partial page is ever
/// returned alongside an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PaginationError {
    #[error(transparent)]
    ColumnNotFound(#[from] ColumnNotFoundError),
    #[error("invalid pagination parameter {name}={value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
    #[error("grouping requires at least one column")]
    EmptyGrouping,
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    GroupAnnotation(#[from] GroupAnnotationError),
}

impl PaginationError {
    pub fn invalid_parameter(name: &'static str, value: impl ToString, reason: &'static str) -> Self {
        Self::InvalidParameter { name, value: value.to_string(), reason }
    }

    /// Whether the request itself was at fault (as opposed to a collaborator).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::ColumnNotFound(_) | Self::InvalidParameter { .. } | Self::EmptyGrouping
        )
    }
}
