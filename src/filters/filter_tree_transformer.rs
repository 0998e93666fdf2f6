use indexmap::IndexSet;
use serde_json::Value;

use crate::{
    columns::{ColumnNotFoundError, ColumnRef, ResolvedColumns},
    filters::{FilterFolder, FilterNode, LogicalOp},
};

/// Filter tree keyed by column name, as handed to the record store.
pub type NamedFilter = FilterNode<String>;

/// Translates client filter trees (column ids) into store filter trees
/// (column names). An absent tree is the empty filter and passes through both
/// operations untouched.
pub struct FilterTreeTransformer;

impl FilterTreeTransformer {
    /// Every column id the tree touches: the `field` of each comparison and
    /// each column of a `get_duplicates` node.
    pub fn collect_referenced_columns(tree: Option<&FilterNode<ColumnRef>>) -> IndexSet<ColumnRef> {
        tree.map(FilterNode::referenced_columns).unwrap_or_default()
    }

    /// Build a copy of `tree` with every column id replaced by its name.
    ///
    /// The input tree is only borrowed, so callers can keep using it.
    pub fn rewrite_with_names(
        tree: Option<&FilterNode<ColumnRef>>,
        resolved: &ResolvedColumns,
    ) -> Result<Option<NamedFilter>, ColumnNotFoundError> {
        tree.map(|node| node.fold(&mut NameRewriter { resolved })).transpose()
    }
}

struct NameRewriter<'a> {
    resolved: &'a ResolvedColumns,
}

impl FilterFolder<ColumnRef> for NameRewriter<'_> {
    type Output = NamedFilter;
    type Error = ColumnNotFoundError;

    fn logical(&mut self, op: LogicalOp, children: Vec<NamedFilter>) -> Result<NamedFilter, ColumnNotFoundError> {
        Ok(FilterNode::Logical { op, children })
    }

    fn comparison(&mut self, op: &str, field: &ColumnRef, value: &Value) -> Result<NamedFilter, ColumnNotFoundError> {
        Ok(FilterNode::Comparison {
            op: op.to_string(),
            field: self.resolved.name_of(*field)?.to_string(),
            value: value.clone(),
        })
    }

    fn duplicates(&mut self, columns: &[ColumnRef]) -> Result<NamedFilter, ColumnNotFoundError> {
        let columns = columns
            .iter()
            .map(|id| self.resolved.name_of(*id).map(str::to_string))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FilterNode::Duplicates { columns })
    }
}
