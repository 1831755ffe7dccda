//! Pagination utilities for service layer
//!
//! `Pagination` carries the caller's raw page/limit; `normalize` clamps it to
//! a `PageWindow` the repositories can use directly.

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: u64 = 50;

/// Pagination parameters as requested
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based page index
    pub page: i64,
    /// items per page
    pub limit: i64,
}

/// Clamped window over an ordered result set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageWindow {
    /// 1-based, always >= 1
    pub page: u64,
    /// always within 1..=MAX_LIMIT
    pub limit: u64,
    /// `(page - 1) * limit`, saturating
    pub offset: u64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64) -> Self { Self { page, limit } }

    /// Build from query-string values. Missing, non-numeric and zero values
    /// fall back to the defaults; everything else is left for `normalize`.
    pub fn from_raw(page: Option<&str>, limit: Option<&str>) -> Self {
        Self {
            page: parse_or(page, DEFAULT_PAGE),
            limit: parse_or(limit, DEFAULT_LIMIT),
        }
    }

    /// Clamp page to >= 1 and limit to 1..=MAX_LIMIT.
    pub fn normalize(self) -> PageWindow {
        let page = self.page.max(1) as u64;
        let limit = self.limit.clamp(1, MAX_LIMIT as i64) as u64;
        // Postgres OFFSET is a signed bigint.
        let offset = (page - 1).saturating_mul(limit).min(i64::MAX as u64);
        PageWindow { page, limit, offset }
    }
}

impl Default for Pagination {
    fn default() -> Self { Self { page: DEFAULT_PAGE, limit: DEFAULT_LIMIT } }
}

fn parse_or(raw: Option<&str>, default: i64) -> i64 {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else { return default };
    let parsed = raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| f.trunc().clamp(i64::MIN as f64, i64::MAX as f64) as i64)
    });
    match parsed {
        Some(0) | None => default,
        Some(v) => v,
    }
}
