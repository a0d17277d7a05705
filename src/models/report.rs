//! Dashboard and report types

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::enums::BookStatusFilter;

/// Dashboard counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BooksMetrics {
    pub available: i64,
    /// All checked-out books, delayed ones included
    pub checkedout: i64,
    /// Checked out with a due date before today
    pub delayed: i64,
    pub total_books: i64,
    pub total_customers: i64,
}

/// Filters for the books export
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct BooksReportQuery {
    pub title: Option<String>,
    pub status: Option<BookStatusFilter>,
}
