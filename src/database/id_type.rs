use serde::{Deserialize, Serialize};

/// How a table keys its rows.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum IdType {
    /// Fresh UUID v4 strings.
    #[default]
    Uuid,
    /// Sequential integers starting at 1.
    Int,
    /// Rows bring their own id under the configured key.
    None,
}
