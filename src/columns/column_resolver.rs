use indexmap::{IndexMap, IndexSet};
use tracing::{debug, trace};

use crate::columns::{CatalogError, ColumnCatalog, ColumnMeta, ColumnNotFoundError, ColumnRef};

/// Column metadata resolved for a single request.
///
/// Built once per request and shared by the order-by, grouping and filter
/// rewrites so that all three see the same column identities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedColumns {
    columns: IndexMap<ColumnRef, ColumnMeta>,
}

impl ResolvedColumns {
    pub fn from_columns(columns: impl IntoIterator<Item = ColumnMeta>) -> Self {
        Self {
            columns: columns.into_iter().map(|column| (column.id, column)).collect(),
        }
    }

    pub fn get(&self, id: ColumnRef) -> Result<&ColumnMeta, ColumnNotFoundError> {
        self.columns.get(&id).ok_or(ColumnNotFoundError::new(id))
    }

    pub fn name_of(&self, id: ColumnRef) -> Result<&str, ColumnNotFoundError> {
        self.get(id).map(|column| column.name.as_str())
    }

    pub fn contains(&self, id: ColumnRef) -> bool {
        self.columns.contains_key(&id)
    }

    /// Fails on the first id of `ids` that did not resolve.
    pub fn ensure_all<'a>(&self, ids: impl IntoIterator<Item = &'a ColumnRef>) -> Result<(), ColumnNotFoundError> {
        match ids.into_iter().find(|id| !self.contains(**id)) {
            Some(id) => Err(ColumnNotFoundError::new(*id)),
            None => Ok(()),
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnMeta> {
        self.columns.values()
    }
}

pub struct ColumnResolver;

impl ColumnResolver {
    /// Resolve `ids` with a single batched catalog lookup.
    ///
    /// The result covers exactly the requested ids the catalog knows; entries
    /// the catalog returns for ids nobody asked for are dropped.
    pub fn resolve(catalog: &dyn ColumnCatalog, ids: &IndexSet<ColumnRef>) -> Result<ResolvedColumns, CatalogError> {
        if ids.is_empty() {
            trace!("no column references to resolve");
            return Ok(ResolvedColumns::default());
        }

        let found = catalog.lookup(ids)?;
        let columns: IndexMap<ColumnRef, ColumnMeta> = found
            .into_iter()
            .filter(|(id, _)| ids.contains(id))
            .collect();

        debug!(requested = ids.len(), resolved = columns.len(), "resolved column references");
        Ok(ResolvedColumns { columns })
    }
}
