//! Paged listing envelope.

use serde::{Deserialize, Serialize};

/// Pagination metadata attached to every listing response.
///
/// `total` is the collection size as reported by the server at the time of
/// the call, `skip` the requested offset and `count` the requested page size
/// (not necessarily the number of entities returned).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pagination {
    pub total: u64,
    pub skip: u64,
    pub count: u64,
}

/// One page of a remote collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    /// An empty page, as the API signals with `204 No Content`.
    pub fn empty(skip: u64, count: u64) -> Self {
        Self {
            data: Vec::new(),
            pagination: Pagination {
                total: 0,
                skip,
                count,
            },
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether entities exist beyond this page according to `total`.
    pub fn has_more(&self) -> bool {
        self.pagination.skip.saturating_add(self.data.len() as u64) < self.pagination.total
    }

    /// Number of pages of `page_size` needed to cover `total`.
    pub fn page_count(&self, page_size: u64) -> u64 {
        if page_size == 0 {
            return 0;
        }
        self.pagination.total.div_ceil(page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_listing_envelope() {
        let page: Page<u32> = serde_json::from_str(
            r#"{"data": [1, 2, 3], "pagination": {"total": 12, "skip": 5, "count": 5}}"#,
        )
        .unwrap();
        assert_eq!(page.len(), 3);
        assert_eq!(page.pagination.total, 12);
        assert!(page.has_more());
        assert_eq!(page.page_count(5), 3);
    }

    #[test]
    fn test_empty_page() {
        let page: Page<u32> = Page::empty(10, 5);
        assert!(page.is_empty());
        assert!(!page.has_more());
        assert_eq!(page.pagination.skip, 10);
        assert_eq!(page.page_count(0), 0);
    }
}
