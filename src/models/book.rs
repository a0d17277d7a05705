//! Book model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::enums::{BookStatus, BookStatusFilter};
use crate::error::AppError;

/// Raw `books` row; `status` is checked when converting to [`Book`]
#[derive(Debug, Clone, FromRow)]
pub struct BookRow {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub description: String,
    pub status: String,
    pub due_date: Option<NaiveDate>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Book as seen by services and handlers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub description: String,
    pub status: BookStatus,
    /// Only set while the book is checked out
    pub due_date: Option<NaiveDate>,
    /// Optimistic concurrency version, bumped on every status change
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<BookRow> for Book {
    type Error = AppError;

    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        let status = BookStatus::try_from(row.status.as_str())
            .map_err(|e| AppError::InvalidState(format!("Book {}: {}", row.id, e)))?;
        Ok(Book {
            id: row.id,
            title: row.title,
            author: row.author,
            isbn: row.isbn,
            description: row.description,
            status,
            due_date: row.due_date,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl Book {
    /// True when checked out and the due date's calendar day is strictly
    /// before the calendar day of `as_of` (both in UTC).
    pub fn is_overdue(&self, as_of: DateTime<Utc>) -> bool {
        match (self.status, self.due_date) {
            (BookStatus::CheckedOut, Some(due)) => due < as_of.date_naive(),
            _ => false,
        }
    }
}

/// Book with its derived overdue flag
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookDetails {
    #[serde(flatten)]
    pub book: Book,
    /// Derived at read time, never stored
    pub overdue: bool,
}

impl BookDetails {
    pub fn new(book: Book, as_of: DateTime<Utc>) -> Self {
        let overdue = book.is_overdue(as_of);
        Self { book, overdue }
    }
}

/// Status/due-date pair written by the tracking workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookState {
    pub status: BookStatus,
    pub due_date: Option<NaiveDate>,
}

/// Create book request. New books always start AVAILABLE.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 3, message = "Title must be at least 3 characters"))]
    pub title: String,
    #[validate(length(min = 3, message = "Author must be at least 3 characters"))]
    pub author: String,
    #[validate(length(min = 3, message = "ISBN must be at least 3 characters"))]
    pub isbn: String,
    #[validate(length(min = 3, message = "Description must be at least 3 characters"))]
    pub description: String,
}

/// Update book request (descriptive fields only)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 3, message = "Title must be at least 3 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 3, message = "Author must be at least 3 characters"))]
    pub author: Option<String>,
    #[validate(length(min = 3, message = "ISBN must be at least 3 characters"))]
    pub isbn: Option<String>,
    #[validate(length(min = 3, message = "Description must be at least 3 characters"))]
    pub description: Option<String>,
}

/// Book list query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    /// Case-insensitive title search
    pub title: Option<String>,
    /// AVAILABLE, CHECKED_OUT or DELAYED
    pub status: Option<BookStatusFilter>,
    /// Page number (1-based)
    pub page: Option<i64>,
    /// Items per page
    pub per_page: Option<i64>,
}
