use std::sync::PoisonError;

use thiserror::Error;

/// Failures reported by a record store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Backend could not serve the request (down, timed out, lock poisoned).
    #[error("record storage unavailable: {0}")]
    Unavailable(String),
    #[error("unknown column '{0}'")]
    UnknownColumn(String),
    #[error("unsupported filter operator '{0}'")]
    UnsupportedOperator(String),
    #[error("unsupported grouping mode '{0}'")]
    UnsupportedGrouping(String),
    #[error("invalid value for '{op}': {reason}")]
    InvalidValue { op: String, reason: String },
    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl<T> From<PoisonError<T>> for StorageError {
    fn from(_: PoisonError<T>) -> Self {
        StorageError::Unavailable("lock poisoned".to_string())
    }
}
