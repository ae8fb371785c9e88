pub mod auth;
pub mod authors;
pub mod books;
pub mod comments;
pub mod error;
pub mod notifications;
pub mod posts;
pub mod profile;
pub mod social;

pub use error::{ApiError, ApiResult};

use axum::http::HeaderMap;
use serde::Deserialize;
use uuid::Uuid;

use crate::state::AppState;

const DEFAULT_PAGE_SIZE: u32 = 10;
const MAX_PAGE_SIZE: u32 = 100;

/// Extract user ID from session token header
pub(crate) fn get_user_from_headers(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Uuid, ApiError> {
    let token = headers
        .get("X-Session-Token")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing session token".to_string()))?;

    state
        .get_authenticated_user_id_from_token(token)
        .ok_or_else(|| ApiError::Unauthorized("Invalid session token".to_string()))
}

/// Page-number pagination parameters shared by list endpoints
#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
}

impl PaginationQuery {
    /// Resolve to (page, page_size, offset). Page numbers start at 1 and
    /// page sizes are clamped to the allowed range. The offset is u64:
    /// the largest page number times the largest page size overflows u32.
    pub fn resolve(&self) -> (u32, u32, u64) {
        let page = self.page.unwrap_or(1).max(1);
        let page_size = self
            .page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let offset = u64::from(page - 1) * u64::from(page_size);
        (page, page_size, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pagination_defaults() {
        let query = PaginationQuery {
            page: None,
            page_size: None,
        };
        assert_eq!(query.resolve(), (1, 10, 0));
    }

    #[test]
    fn test_pagination_clamps_page_size() {
        let query = PaginationQuery {
            page: Some(3),
            page_size: Some(500),
        };
        assert_eq!(query.resolve(), (3, 100, 200));

        let query = PaginationQuery {
            page: Some(0),
            page_size: Some(0),
        };
        assert_eq!(query.resolve(), (1, 1, 0));
    }

    #[test]
    fn test_pagination_huge_page_does_not_overflow() {
        let query = PaginationQuery {
            page: Some(50_000_000),
            page_size: Some(100),
        };
        assert_eq!(query.resolve(), (50_000_000, 100, 4_999_999_900));

        let query = PaginationQuery {
            page: Some(u32::MAX),
            page_size: Some(u32::MAX),
        };
        let (_, page_size, offset) = query.resolve();
        assert_eq!(page_size, MAX_PAGE_SIZE);
        assert_eq!(offset, u64::from(u32::MAX - 1) * u64::from(MAX_PAGE_SIZE));
    }

    // For any client-supplied values, the resolved page size stays in
    // range and the offset addresses the start of the requested page.
    proptest! {
        #[test]
        fn prop_resolved_pagination_is_always_valid(
            page in proptest::option::of(any::<u32>()),
            page_size in proptest::option::of(any::<u32>()),
        ) {
            let query = PaginationQuery { page, page_size };
            let (page, page_size, offset) = query.resolve();

            prop_assert!(page >= 1);
            prop_assert!((1..=MAX_PAGE_SIZE).contains(&page_size));
            prop_assert_eq!(offset, u64::from(page - 1) * u64::from(page_size));
        }
    }
}
