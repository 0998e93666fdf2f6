use serde::{Deserialize, Serialize};

use crate::{grouping::GroupResult, storage::Record};

/// Response envelope: `{count, grouping?, results}`.
///
/// `count` is the filtered total before paging, so clients can work out how
/// many pages exist whatever limit they used.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PageResult<T = Record> {
    pub count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grouping: Option<GroupResult>,
    pub results: Vec<T>,
}

impl<T> PageResult<T> {
    pub fn new(count: u64, results: Vec<T>) -> Self {
        Self { count, grouping: None, results }
    }

    pub fn page_count(&self, limit: u64) -> u64 {
        if limit == 0 {
            return 0;
        }
        self.count.div_ceil(limit)
    }
}
