//! Common types and utilities shared across handlers and services

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Page size used when a list request does not ask for one
pub const DEFAULT_PAGE_SIZE: u64 = 100;
/// Upper bound on any page size
pub const MAX_PAGE_SIZE: u64 = 500;

/// Pagination parameters accepted by list endpoints.
///
/// `skip` is the legacy raw offset and wins over `page` when both are sent.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// 1-based page number
    pub page: Option<u64>,
    /// Items per page (max 500)
    pub limit: Option<u64>,
    /// Raw row offset
    pub skip: Option<u64>,
}

/// Resolved offset/limit for a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u64,
    pub limit: u64,
    pub offset: u64,
}

impl ListParams {
    pub fn new(page: Option<u64>, limit: Option<u64>, skip: Option<u64>) -> Self {
        Self { page, limit, skip }
    }

    pub fn window(&self) -> PageWindow {
        self.window_with_default(DEFAULT_PAGE_SIZE)
    }

    pub fn window_with_default(&self, default_limit: u64) -> PageWindow {
        let limit = self.limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_SIZE);
        match self.skip {
            Some(offset) => PageWindow {
                page: offset / limit + 1,
                limit,
                offset,
            },
            None => {
                let page = self.page.unwrap_or(1).max(1);
                PageWindow {
                    page,
                    limit,
                    offset: (page - 1) * limit,
                }
            }
        }
    }
}

/// Treats blank strings from forms as absent.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Compact timestamp used in generated document numbers and file names.
pub fn compact_timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d%H%M%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ListParams::new(None, None, None), PageWindow { page: 1, limit: 100, offset: 0 })]
    #[case(ListParams::new(Some(3), Some(20), None), PageWindow { page: 3, limit: 20, offset: 40 })]
    #[case(ListParams::new(Some(0), Some(10_000), None), PageWindow { page: 1, limit: 500, offset: 0 })]
    #[case(ListParams::new(Some(9), Some(50), Some(100)), PageWindow { page: 3, limit: 50, offset: 100 })]
    fn resolves_page_window(#[case] params: ListParams, #[case] expected: PageWindow) {
        assert_eq!(params.window(), expected);
    }

    #[test]
    fn blank_strings_become_none() {
        assert_eq!(non_empty(Some("   ".into())), None);
        assert_eq!(non_empty(Some(" QC01 ".into())), Some("QC01".into()));
        assert_eq!(non_empty(None), None);
    }
}
