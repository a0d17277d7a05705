//! Data models for Shelfdesk

pub mod book;
pub mod customer;
pub mod enums;
pub mod report;
pub mod tracking;

// Re-export commonly used types
pub use book::{Book, BookDetails, BookState};
pub use customer::{Customer, CustomerShort};
pub use enums::{BookStatus, BookStatusFilter, TrackingAction};
pub use report::BooksMetrics;
pub use tracking::{TrackingDetails, TrackingRecord};

use crate::config::PaginationConfig;

/// Resolved page window for list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub per_page: i64,
}

impl Page {
    /// Apply defaults and clamp to the configured maximum
    pub fn resolve(page: Option<i64>, per_page: Option<i64>, config: &PaginationConfig) -> Self {
        let page = page.unwrap_or(1).max(1);
        let per_page = per_page
            .unwrap_or(config.default_per_page)
            .clamp(1, config.max_per_page.max(1));
        Self { page, per_page }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }
}
