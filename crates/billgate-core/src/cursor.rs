//! Pagination cursor
//!
//! A [`Cursor`] is derived from the `limit`, `offset` and `sort` query
//! parameters. Once resolved against a [`PaginationConfig`] it always
//! satisfies `0 < limit <= limit_max`, and resolving it again is a no-op.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Pagination defaults injected into every list request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Limit used when the caller gives none (or an invalid one)
    #[serde(default = "default_limit")]
    pub limit_default: u32,

    /// Offset used when the caller gives none (or an invalid one)
    #[serde(default)]
    pub offset_default: u32,

    /// Hard ceiling for the limit
    #[serde(default = "default_limit_max")]
    pub limit_max: u32,
}

fn default_limit() -> u32 {
    100
}

fn default_limit_max() -> u32 {
    1000
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            limit_default: default_limit(),
            offset_default: 0,
            limit_max: default_limit_max(),
        }
    }
}

impl PaginationConfig {
    /// Check the defaults are consistent with the ceiling
    pub fn validate(&self) -> Result<()> {
        if self.limit_default == 0 {
            return Err(CoreError::InvalidConfiguration(
                "pagination limit_default must be positive".to_string(),
            ));
        }

        if self.limit_max < self.limit_default {
            return Err(CoreError::InvalidConfiguration(format!(
                "pagination limit_max ({}) is lower than limit_default ({})",
                self.limit_max, self.limit_default
            )));
        }

        Ok(())
    }
}

/// Resolved pagination parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    /// Maximum number of items
    pub limit: u32,

    /// Number of items to skip
    pub offset: u32,

    /// Sort fields, `-` prefix for descending
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<String>,
}

impl Cursor {
    /// Build a resolved cursor from raw query pairs
    ///
    /// Unparsable or non-positive limits fall back to the default, limits
    /// above the ceiling are clamped. Both `sort` and `sort[]` keys are
    /// accepted and may repeat.
    pub fn from_query(query: &[(String, String)], config: &PaginationConfig) -> Self {
        let mut limit: Option<i64> = None;
        let mut offset: Option<i64> = None;
        let mut sort = Vec::new();

        for (key, value) in query {
            match key.as_str() {
                "limit" => limit = value.trim().parse().ok(),
                "offset" => offset = value.trim().parse().ok(),
                "sort" | "sort[]" => {
                    sort.extend(
                        value
                            .split(',')
                            .map(str::trim)
                            .filter(|s| !s.is_empty())
                            .map(String::from),
                    );
                }
                _ => {}
            }
        }

        Self::from_raw(limit, offset, sort, config)
    }

    /// Resolve an already-built cursor again
    pub fn resolve(self, config: &PaginationConfig) -> Self {
        Self::from_raw(
            Some(i64::from(self.limit)),
            Some(i64::from(self.offset)),
            self.sort,
            config,
        )
    }

    fn from_raw(
        limit: Option<i64>,
        offset: Option<i64>,
        sort: Vec<String>,
        config: &PaginationConfig,
    ) -> Self {
        let limit = match limit {
            Some(l) if l > 0 => l.min(i64::from(config.limit_max)) as u32,
            _ => config.limit_default.min(config.limit_max),
        };

        let offset = match offset {
            Some(o) if o >= 0 => o.min(i64::from(u32::MAX)) as u32,
            _ => config.offset_default,
        };

        Self {
            limit,
            offset,
            sort,
        }
    }
}
