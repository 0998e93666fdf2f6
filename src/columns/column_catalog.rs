use indexmap::{IndexMap, IndexSet};

use crate::columns::{CatalogError, ColumnMeta, ColumnRef};

/// Source of column metadata keyed by client column id.
pub trait ColumnCatalog {
    /// Look up every id in `ids` in one round trip.
    ///
    /// Ids the catalog does not know are left out of the returned map; it is up
    /// to the caller to decide whether that is an error.
    fn lookup(&self, ids: &IndexSet<ColumnRef>) -> Result<IndexMap<ColumnRef, ColumnMeta>, CatalogError>;
}

impl ColumnCatalog for [ColumnMeta] {
    fn lookup(&self, ids: &IndexSet<ColumnRef>) -> Result<IndexMap<ColumnRef, ColumnMeta>, CatalogError> {
        Ok(self.iter()
            .filter(|column| ids.contains(&column.id))
            .map(|column| (column.id, column.clone()))
            .collect())
    }
}

impl ColumnCatalog for Vec<ColumnMeta> {
    fn lookup(&self, ids: &IndexSet<ColumnRef>) -> Result<IndexMap<ColumnRef, ColumnMeta>, CatalogError> {
        self.as_slice().lookup(ids)
    }
}
