use serde::{Deserialize, Serialize};

use crate::pagination::PaginationError;

pub const LIMIT_PARAM: &str = "limit";
pub const OFFSET_PARAM: &str = "offset";

/// Limit and offset exactly as the client asked for them.
///
/// Validation and the limit policy are applied later by
/// [`crate::pagination::PaginationConfig::window`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PageParams {
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

impl PageParams {
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        Self { limit, offset }
    }

    /// Read `limit` and `offset` from query-string pairs.
    ///
    /// Other keys are ignored and blank values count as absent.
    pub fn from_query<'a, I>(pairs: I) -> Result<Self, PaginationError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            match key {
                LIMIT_PARAM => params.limit = Self::parse_int(LIMIT_PARAM, value)?,
                OFFSET_PARAM => params.offset = Self::parse_int(OFFSET_PARAM, value)?,
                _ => {}
            }
        }
        Ok(params)
    }

    fn parse_int(name: &'static str, value: &str) -> Result<Option<i64>, PaginationError> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(None);
        }
        value
            .parse::<i64>()
            .map(Some)
            .map_err(|_| PaginationError::invalid_parameter(name, value, "must be an integer"))
    }
}
