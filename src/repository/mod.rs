//! Repository layer for database operations
//!
//! The tracking workflow only sees the three store traits below; the
//! PostgreSQL repositories implement them.

pub mod books;
pub mod customers;
#[cfg(test)]
pub mod memory;
pub mod reports;
pub mod tracking;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{
        tracking::{TrackingCorrection, TransitionCommit},
        Book, BookState, CustomerShort, Page, TrackingRecord,
    },
};

/// Read side of the books table as needed by the workflow
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Fails with `NotFound` for an unknown book
    async fn get(&self, id: i32) -> AppResult<Book>;
}

/// Append-only tracking history.
///
/// Every write also updates the owning book's `status`/`due_date` in the same
/// transaction, so the book always agrees with its most recent record.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TrackingLogStore: Send + Sync {
    async fn get(&self, id: i32) -> AppResult<Option<TrackingRecord>>;

    /// Most recent record of the book if it is an unreturned CHECK_OUT
    async fn most_recent_open(&self, book_id: i32) -> AppResult<Option<TrackingRecord>>;

    async fn find_by_idempotency_key(
        &self,
        book_id: i32,
        key: &str,
    ) -> AppResult<Option<TrackingRecord>>;

    /// History of a book, newest first
    async fn list_for_book(&self, book_id: i32, page: Page) -> AppResult<(Vec<TrackingRecord>, i64)>;

    /// Append the record and move the book to its new state.
    /// Fails with `ConcurrentModification` if the book version moved.
    async fn append(&self, commit: &TransitionCommit) -> AppResult<TrackingRecord>;

    /// Rewrite customer/due date of an open record and mirror the due date
    /// onto the book. Same version guard as `append`.
    async fn correct(&self, correction: &TrackingCorrection) -> AppResult<TrackingRecord>;

    /// Delete a record and re-derive the book state from what remains.
    /// Returns the re-derived state, `None` if the record did not exist.
    async fn delete(&self, id: i32) -> AppResult<Option<BookState>>;
}

/// Customer lookups used for attribution
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    async fn exists(&self, id: i32) -> AppResult<bool>;

    /// Fails with `NotFound` for an unknown customer
    async fn get_short(&self, id: i32) -> AppResult<CustomerShort>;
}

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub books: books::BooksRepository,
    pub customers: customers::CustomersRepository,
    pub tracking: tracking::TrackingRepository,
    pub reports: reports::ReportsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            customers: customers::CustomersRepository::new(pool.clone()),
            tracking: tracking::TrackingRepository::new(pool.clone()),
            reports: reports::ReportsRepository::new(pool.clone()),
            pool,
        }
    }
}
