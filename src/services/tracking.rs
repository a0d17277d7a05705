//! Checkout/return workflow
//!
//! A book cycles AVAILABLE -> CHECKED_OUT -> AVAILABLE. Each transition
//! appends one tracking record and moves the book's status/due date in the
//! same unit of work, guarded by the book version. Overdue is derived from the
//! due date at read time and never stored.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::{
        tracking::{
            EditTracking, RecordTransition, TrackingCorrection, TrackingEntry, TransitionCommit,
        },
        Book, BookDetails, BookState, BookStatus, Page, TrackingAction, TrackingDetails,
        TrackingRecord,
    },
    repository::{BookStore, CustomerDirectory, TrackingLogStore},
};

use super::clock::Clock;

/// Next legal action of a book, for the checkout/return form
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NextAction {
    pub book_id: i32,
    pub status: BookStatus,
    pub next_action: TrackingAction,
    pub due_date: Option<chrono::NaiveDate>,
    pub overdue: bool,
}

/// The single action a book in this state accepts
pub fn determine_next_action(book: &Book) -> TrackingAction {
    book.status.next_action()
}

/// Overdue at day granularity; books that are not checked out never are
pub fn is_overdue(book: &Book, as_of: DateTime<Utc>) -> bool {
    book.is_overdue(as_of)
}

#[derive(Clone)]
pub struct TrackingService {
    books: Arc<dyn BookStore>,
    log: Arc<dyn TrackingLogStore>,
    customers: Arc<dyn CustomerDirectory>,
    clock: Arc<dyn Clock>,
}

impl TrackingService {
    pub fn new(
        books: Arc<dyn BookStore>,
        log: Arc<dyn TrackingLogStore>,
        customers: Arc<dyn CustomerDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { books, log, customers, clock }
    }

    /// Current status and next action of a book
    pub async fn next_action(&self, book_id: i32) -> AppResult<NextAction> {
        let book = self.books.get(book_id).await?;
        Ok(NextAction {
            book_id: book.id,
            status: book.status,
            next_action: determine_next_action(&book),
            due_date: book.due_date,
            overdue: is_overdue(&book, self.clock.now()),
        })
    }

    /// Check a book out or in.
    ///
    /// The action must be the book's next action. Checking out needs a due
    /// date no earlier than today; a due date sent with a check-in is dropped.
    /// A retry carrying an already-used idempotency key returns the record
    /// created by the first attempt.
    pub async fn record_transition(
        &self,
        book_id: i32,
        request: RecordTransition,
    ) -> AppResult<TrackingRecord> {
        if let Some(key) = request.idempotency_key.as_deref() {
            if let Some(existing) = self.log.find_by_idempotency_key(book_id, key).await? {
                let same_due_date = match request.action {
                    TrackingAction::CheckOut => existing.due_date == request.due_date,
                    TrackingAction::CheckIn => true,
                };
                if existing.action != request.action
                    || existing.customer_id != request.customer_id
                    || !same_due_date
                {
                    return Err(AppError::BadRequest(format!(
                        "Idempotency key '{}' was already used for a different transition",
                        key
                    )));
                }
                tracing::info!(book_id, record_id = existing.id, "Replayed tracking transition");
                return Ok(existing);
            }
        }

        let book = self.books.get(book_id).await?;
        let expected = determine_next_action(&book);
        if request.action != expected {
            return Err(AppError::IllegalTransition(format!(
                "Book {} is {}; the next action is {}, not {}",
                book_id, book.status, expected, request.action
            )));
        }

        let due_date = match request.action {
            TrackingAction::CheckOut => {
                let due = request.due_date.ok_or_else(|| {
                    AppError::Validation("due_date is required to check a book out".to_string())
                })?;
                let today = self.clock.today();
                if due < today {
                    return Err(AppError::Validation(format!(
                        "due_date {} is earlier than today ({})",
                        due, today
                    )));
                }
                Some(due)
            }
            TrackingAction::CheckIn => None,
        };

        if !self.customers.exists(request.customer_id).await? {
            return Err(AppError::NotFound(format!(
                "Customer with id {} not found",
                request.customer_id
            )));
        }

        let commit = TransitionCommit {
            book_id,
            expected_version: book.version,
            customer_id: request.customer_id,
            action: request.action,
            due_date,
            idempotency_key: request.idempotency_key,
            created_at: self.clock.now(),
        };
        let record = self.log.append(&commit).await?;

        tracing::info!(
            book_id,
            record_id = record.id,
            customer_id = record.customer_id,
            action = %record.action,
            "Recorded tracking transition"
        );
        Ok(record)
    }

    /// Correct the customer and/or due date of the book's open record.
    /// The action itself is never rewritten. Only a due date that differs
    /// from the stored one is checked against today.
    pub async fn edit_open_tracking(
        &self,
        record_id: i32,
        edit: EditTracking,
    ) -> AppResult<TrackingRecord> {
        let record = self.get_record(record_id).await?;

        // Book first: its version guards everything read after it
        let book = self.books.get(record.book_id).await?;

        let open = self.log.most_recent_open(record.book_id).await?;
        if open.as_ref().map(|r| r.id) != Some(record.id) {
            return Err(AppError::IllegalTransition(format!(
                "Tracking record {} is not the open checkout of book {}",
                record_id, record.book_id
            )));
        }

        if book.status != BookStatus::CheckedOut {
            return Err(AppError::ConcurrentModification(format!(
                "Book {} changed while its checkout was being edited",
                book.id
            )));
        }

        let customer_id = match edit.customer_id {
            Some(id) if id != record.customer_id => {
                if !self.customers.exists(id).await? {
                    return Err(AppError::NotFound(format!("Customer with id {} not found", id)));
                }
                id
            }
            _ => record.customer_id,
        };

        let due_date = match edit.due_date {
            Some(due) if Some(due) != record.due_date => {
                let today = self.clock.today();
                if due < today {
                    return Err(AppError::Validation(format!(
                        "due_date {} is earlier than today ({})",
                        due, today
                    )));
                }
                Some(due)
            }
            _ => record.due_date,
        };

        let correction = TrackingCorrection {
            record_id,
            book_id: record.book_id,
            expected_version: book.version,
            customer_id,
            due_date,
            updated_at: self.clock.now(),
        };
        let updated = self.log.correct(&correction).await?;

        tracing::info!(book_id = record.book_id, record_id, "Corrected open tracking record");
        Ok(updated)
    }

    /// Delete a record; the book's state is re-derived from what remains
    pub async fn delete_tracking(&self, record_id: i32) -> AppResult<BookState> {
        let state = self
            .log
            .delete(record_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tracking record {} not found", record_id)))?;

        tracing::info!(record_id, status = %state.status, "Deleted tracking record");
        Ok(state)
    }

    pub async fn get_record(&self, record_id: i32) -> AppResult<TrackingRecord> {
        self.log
            .get(record_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tracking record {} not found", record_id)))
    }

    /// Record scoped to a book; a record of another book is reported as missing
    pub async fn record_for_book(&self, book_id: i32, record_id: i32) -> AppResult<TrackingRecord> {
        let record = self.get_record(record_id).await?;
        if record.book_id != book_id {
            return Err(AppError::NotFound(format!(
                "Tracking record {} not found for book {}",
                record_id, book_id
            )));
        }
        Ok(record)
    }

    /// Record with its customer and book
    pub async fn get_details(&self, record_id: i32) -> AppResult<TrackingDetails> {
        let record = self.get_record(record_id).await?;
        let customer = self.customers.get_short(record.customer_id).await?;
        let book = self.books.get(record.book_id).await?;
        Ok(TrackingDetails { record, customer, book })
    }

    /// Paginated history of a book, newest first
    pub async fn history(
        &self,
        book_id: i32,
        page: Page,
    ) -> AppResult<(BookDetails, Vec<TrackingEntry>, i64)> {
        let book = self.books.get(book_id).await?;
        let (records, total) = self.log.list_for_book(book_id, page).await?;

        let mut entries = Vec::with_capacity(records.len());
        for record in records {
            let customer = self.customers.get_short(record.customer_id).await?;
            entries.push(TrackingEntry { record, customer });
        }

        Ok((BookDetails::new(book, self.clock.now()), entries, total))
    }
}
