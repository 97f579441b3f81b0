//! Page/limit windowing for list endpoints

use serde::{Deserialize, Serialize};

/// Query parameters for paginated listings
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    /// Page number (1-based)
    pub page: Option<u32>,
    /// Number of items per page
    pub limit: Option<u32>,
}

/// A resolved page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Page {
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const MAX_LIMIT: u32 = 100;

    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
        }
    }

    /// Rows skipped before this page
    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }

    pub fn limit(&self) -> i64 {
        self.limit as i64
    }

    pub fn wrap<T>(self, items: Vec<T>, total_count: i64) -> Paginated<T> {
        Paginated {
            items,
            page: self.page,
            limit: self.limit,
            total_pages: total_pages(total_count, self.limit),
            total_count,
        }
    }
}

impl From<PageQuery> for Page {
    fn from(query: PageQuery) -> Self {
        Page::new(query.page, query.limit)
    }
}

/// Items plus page metadata
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total_pages: i64,
    pub total_count: i64,
}

/// `ceil(total / limit)`
pub fn total_pages(total_count: i64, limit: u32) -> i64 {
    if total_count <= 0 {
        return 0;
    }
    let limit = limit.max(1) as i64;
    (total_count + limit - 1) / limit
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_first_page_of_ten() {
        let page = Page::new(None, None);
        assert_eq!(page, Page { page: 1, limit: 10 });
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn second_page_of_ten_skips_first_ten() {
        let page = Page::new(Some(2), Some(10));
        assert_eq!(page.offset(), 10);
        assert_eq!(page.limit(), 10);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        assert_eq!(Page::new(Some(0), Some(0)), Page { page: 1, limit: 1 });
        assert_eq!(Page::new(Some(3), Some(5000)).limit, Page::MAX_LIMIT);
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(25, 10), 3);
    }

    #[test]
    fn wrap_reports_metadata_in_camel_case() {
        let page = Page::new(Some(2), Some(10));
        let body = serde_json::to_value(page.wrap(vec![11, 12], 12)).unwrap();

        assert_eq!(body["page"], 2);
        assert_eq!(body["limit"], 10);
        assert_eq!(body["totalPages"], 2);
        assert_eq!(body["totalCount"], 12);
        assert_eq!(body["items"], serde_json::json!([11, 12]));
    }
}
