use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One group reported by the record store.
///
/// `result_indices` are positions in the returned page. Everything else
/// (counts, boundary values, ...) is store-defined and carried opaquely.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GroupMeta {
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
    pub result_indices: Vec<usize>,
}

impl GroupMeta {
    pub fn new(attributes: Map<String, Value>) -> Self {
        Self { attributes, result_indices: Vec::new() }
    }
}

/// Grouping summary attached to a grouped page.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GroupResult {
    pub columns: Vec<String>,
    pub mode: String,
    pub num_groups: usize,
    pub ranged: bool,
    /// `None` when the page came back empty.
    pub groups: Option<Vec<GroupMeta>>,
}
