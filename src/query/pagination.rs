//! Offset pagination arithmetic and the paginated result shape.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Book;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PER_PAGE: i64 = 10;

/// A 1-based page window; both values are always >= 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: i64,
    pub per_page: i64,
}

impl PageWindow {
    pub fn new(page: Option<i64>, per_page: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(DEFAULT_PAGE).max(1),
            per_page: per_page.unwrap_or(DEFAULT_PER_PAGE).max(1),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }
}

impl Default for PageWindow {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// `ceil(total / per_page)`, never less than 1
pub fn total_pages(total: i64, per_page: i64) -> i64 {
    let per_page = per_page.max(1);
    let total = total.max(0);
    // Must not overflow for page sizes near i64::MAX
    let pages = total / per_page + i64::from(total % per_page != 0);
    pages.max(1)
}

/// One page of books plus the numbers the UI needs to render a pager
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResultPage {
    pub data: Vec<Book>,
    /// Matching records before pagination
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl ResultPage {
    pub fn new(data: Vec<Book>, total: i64, window: PageWindow) -> Self {
        Self {
            data,
            total,
            page: window.page,
            per_page: window.per_page,
            total_pages: total_pages(total, window.per_page),
        }
    }
}
