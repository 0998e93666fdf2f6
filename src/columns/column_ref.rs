use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Opaque column identifier supplied by clients.
///
/// Only the column catalog knows what a `ColumnRef` points at. Everything
/// handed to the record store is keyed by column name instead, so a
/// `ColumnRef` never crosses that boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ColumnRef(pub i64);

impl ColumnRef {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for ColumnRef {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl Display for ColumnRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_column_ref_is_a_bare_number_on_the_wire() {
        let id: ColumnRef = serde_json::from_value(json!(7)).unwrap();
        assert_eq!(id, ColumnRef(7));
        assert_eq!(serde_json::to_value(id).unwrap(), json!(7));
    }

    #[test]
    fn test_column_ref_rejects_names() {
        assert!(serde_json::from_value::<ColumnRef>(json!("age")).is_err());
    }
}
