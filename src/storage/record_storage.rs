use serde_json::{Map, Value};

use crate::{
    filters::NamedFilter,
    grouping::GroupingDescriptor,
    pagination::OrderBySpec,
    storage::StorageError,
};

/// A row as returned by the record store.
pub type Record = Map<String, Value>;

/// One page request, entirely in column-name vocabulary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchRequest<'a> {
    pub limit: u64,
    pub offset: u64,
    pub filters: Option<&'a NamedFilter>,
    pub order_by: &'a [OrderBySpec<String>],
    pub grouping: Option<&'a GroupingDescriptor>,
}

/// The record store queried by the pagination controller.
///
/// Implementations execute filtering, ordering and grouping; when `grouping`
/// is set every returned record must carry a group annotation (see
/// [`crate::grouping::GROUP_METADATA_KEY`]).
pub trait RecordStorage {
    /// Number of records matching `filters`, ignoring any paging.
    fn count(&self, filters: Option<&NamedFilter>) -> Result<u64, StorageError>;

    fn fetch(&self, request: &FetchRequest<'_>) -> Result<Vec<Record>, StorageError>;
}
