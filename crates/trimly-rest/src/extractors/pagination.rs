//! Pagination extractor.

use serde::Deserialize;
use trimly_core::PageRequest;

/// Query parameters for pagination. Pages are zero-based.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PaginationQuery {
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub size: Option<usize>,
}

impl From<PaginationQuery> for PageRequest {
    fn from(query: PaginationQuery) -> Self {
        PageRequest::new(
            query.page.unwrap_or(0),
            query.size.unwrap_or(PageRequest::DEFAULT_SIZE),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_first_page() {
        let request: PageRequest = PaginationQuery::default().into();
        assert_eq!(request.offset(), 0);
        assert_eq!(request.limit(), PageRequest::DEFAULT_SIZE);
    }

    #[test]
    fn test_size_is_capped() {
        let request: PageRequest = PaginationQuery {
            page: Some(2),
            size: Some(10_000),
        }
        .into();
        assert_eq!(request.limit(), PageRequest::MAX_SIZE);
        assert_eq!(request.offset(), 2 * PageRequest::MAX_SIZE);
    }

    #[test]
    fn test_huge_page_does_not_overflow() {
        let request: PageRequest = PaginationQuery {
            page: Some(usize::MAX),
            size: None,
        }
        .into();
        assert_eq!(request.offset(), usize::MAX);
    }
}
