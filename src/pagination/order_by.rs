use serde::{Deserialize, Serialize};

use crate::columns::{ColumnNotFoundError, ColumnRef, ResolvedColumns};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum SortDirection {
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

/// One sort key; a list of them sorts by the first, then the second, ...
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct OrderBySpec<F> {
    pub field: F,
    #[serde(default)]
    pub direction: SortDirection,
}

impl<F> OrderBySpec<F> {
    pub fn asc(field: F) -> Self {
        Self { field, direction: SortDirection::Ascending }
    }

    pub fn desc(field: F) -> Self {
        Self { field, direction: SortDirection::Descending }
    }
}

impl OrderBySpec<ColumnRef> {
    pub fn with_name(&self, resolved: &ResolvedColumns) -> Result<OrderBySpec<String>, ColumnNotFoundError> {
        Ok(OrderBySpec {
            field: resolved.name_of(self.field)?.to_string(),
            direction: self.direction,
        })
    }
}
