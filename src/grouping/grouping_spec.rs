use serde::{Deserialize, Serialize};

/// Grouping mode understood by every record store: one group per distinct
/// combination of values.
pub const DISTINCT_MODE: &str = "distinct";

fn default_mode() -> String {
    DISTINCT_MODE.to_string()
}

/// Grouping directive.
///
/// Clients send it keyed by `ColumnRef`; the record store receives the
/// name-keyed [`GroupingDescriptor`]. `mode` and `ranged` are passed through
/// untouched.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GroupingSpec<F> {
    pub columns: Vec<F>,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default)]
    pub ranged: bool,
}

/// Grouping directive in the record store's vocabulary.
pub type GroupingDescriptor = GroupingSpec<String>;

impl<F> GroupingSpec<F> {
    pub fn new(columns: Vec<F>, mode: impl Into<String>, ranged: bool) -> Self {
        Self { columns, mode: mode.into(), ranged }
    }

    pub fn distinct(columns: Vec<F>) -> Self {
        Self::new(columns, DISTINCT_MODE, false)
    }
}
