//! Pagination primitives.
//!
//! Page/limit arrive from untrusted callers and are clamped before any query
//! runs. Totals are always computed from the same filtered predicate as the
//! page itself, so `PageInfo` can be derived purely from `(request, total)`.

use serde::Serialize;

/// Hard upper bound on page size, regardless of the per-surface default.
pub const MAX_LIMIT: u32 = 100;

/// A clamped pagination request. `page` is 1-based.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Clamp caller-supplied values: page >= 1, limit in `1..=MAX_LIMIT`,
    /// with a per-surface default when the caller omits it.
    pub fn clamped(page: Option<u32>, limit: Option<u32>, default_limit: u32) -> Self {
        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(default_limit).clamp(1, MAX_LIMIT);
        Self { page, limit }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

/// Pagination metadata returned alongside every list payload.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub current_page: u32,
    pub total_pages: u32,
    pub limit: u32,
}

impl PageInfo {
    pub fn new(request: &PageRequest, total: u64) -> Self {
        let total_pages = total.div_ceil(u64::from(request.limit)) as u32;
        Self {
            current_page: request.page,
            total_pages,
            limit: request.limit,
        }
    }
}

/// One page of results plus the total matching the same predicate.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}
