use std::{convert::Infallible, hash::Hash};

use indexmap::IndexSet;
use serde_json::Value;

use crate::filters::{FilterNode, LogicalOp};

/// Per-node actions of a post-order walk over a filter tree.
///
/// [`FilterNode::fold`] owns the traversal; implementors only decide what to
/// produce for each kind of node. Children of a logical node are folded in
/// order before the node itself.
pub trait FilterFolder<F> {
    type Output;
    type Error;

    fn logical(&mut self, op: LogicalOp, children: Vec<Self::Output>) -> Result<Self::Output, Self::Error>;

    fn comparison(&mut self, op: &str, field: &F, value: &Value) -> Result<Self::Output, Self::Error>;

    fn duplicates(&mut self, columns: &[F]) -> Result<Self::Output, Self::Error>;
}

impl<F> FilterNode<F> {
    pub fn fold<V: FilterFolder<F>>(&self, folder: &mut V) -> Result<V::Output, V::Error> {
        match self {
            FilterNode::Logical { op, children } => {
                let folded = children
                    .iter()
                    .map(|child| child.fold(&mut *folder))
                    .collect::<Result<Vec<_>, _>>()?;
                folder.logical(*op, folded)
            }
            FilterNode::Comparison { op, field, value } => folder.comparison(op, field, value),
            FilterNode::Duplicates { columns } => folder.duplicates(columns),
        }
    }
}

impl<F: Clone + Eq + Hash> FilterNode<F> {
    /// Every column key the tree references, in first-seen order.
    pub fn referenced_columns(&self) -> IndexSet<F> {
        let mut collector = ColumnCollector { seen: IndexSet::new() };
        match self.fold(&mut collector) {
            Ok(()) => collector.seen,
            Err(never) => match never {},
        }
    }
}

struct ColumnCollector<F> {
    seen: IndexSet<F>,
}

impl<F: Clone + Eq + Hash> FilterFolder<F> for ColumnCollector<F> {
    type Output = ();
    type Error = Infallible;

    fn logical(&mut self, _op: LogicalOp, _children: Vec<()>) -> Result<(), Infallible> {
        Ok(())
    }

    fn comparison(&mut self, _op: &str, field: &F, _value: &Value) -> Result<(), Infallible> {
        self.seen.insert(field.clone());
        Ok(())
    }

    fn duplicates(&mut self, columns: &[F]) -> Result<(), Infallible> {
        self.seen.extend(columns.iter().cloned());
        Ok(())
    }
}
