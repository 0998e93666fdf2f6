use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::pagination::{PageParams, PaginationError};

/// Limit policy for paginated listings.
///
/// - `default_limit` applies when the client does not ask for a limit.
/// - `max_limit` caps what a client may ask for; larger requests are clamped.
///
/// Deserialized configs go through [`PaginationConfig::from`], so missing
/// keys take their defaults and the limits come out normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "RawPaginationConfig")]
pub struct PaginationConfig {
    pub default_limit: u64,
    pub max_limit: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self { default_limit: 50, max_limit: 500 }
    }
}

#[derive(Deserialize)]
#[serde(default)]
struct RawPaginationConfig {
    default_limit: u64,
    max_limit: u64,
}

impl Default for RawPaginationConfig {
    fn default() -> Self {
        let PaginationConfig { default_limit, max_limit } = PaginationConfig::default();
        Self { default_limit, max_limit }
    }
}

impl From<RawPaginationConfig> for PaginationConfig {
    fn from(raw: RawPaginationConfig) -> Self {
        PaginationConfig::from(raw.default_limit, raw.max_limit)
    }
}

/// Concrete limit/offset of one page after applying the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub limit: u64,
    pub offset: u64,
}

impl PaginationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Both limits are raised to at least 1 and the default never exceeds the max.
    pub fn from(default_limit: u64, max_limit: u64) -> Self {
        let max_limit = max_limit.max(1);
        Self {
            default_limit: default_limit.clamp(1, max_limit),
            max_limit,
        }
    }

    pub fn window(&self, params: &PageParams) -> Result<PageWindow, PaginationError> {
        // fields are public, so a hand-built config may skip `from`
        let max_limit = self.max_limit.max(1);
        let limit = match params.limit {
            None => self.default_limit.clamp(1, max_limit),
            Some(limit) if limit <= 0 => {
                return Err(PaginationError::invalid_parameter("limit", limit, "must be a positive integer"));
            }
            Some(limit) => {
                let requested = limit.unsigned_abs();
                if requested > max_limit {
                    debug!(requested, max_limit, "clamping requested limit");
                }
                requested.min(max_limit)
            }
        };

        let offset = match params.offset {
            None => 0,
            Some(offset) if offset < 0 => {
                return Err(PaginationError::invalid_parameter("offset", offset, "must not be negative"));
            }
            Some(offset) => offset.unsigned_abs(),
        };

        Ok(PageWindow { limit, offset })
    }
}
