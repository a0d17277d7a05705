//! In-memory stores for workflow tests

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::{
    error::{AppError, AppResult},
    models::{
        tracking::{TrackingCorrection, TransitionCommit},
        Book, BookState, BookStatus, CustomerShort, Page, TrackingAction, TrackingRecord,
    },
};

use super::{BookStore, CustomerDirectory, TrackingLogStore};

#[derive(Default)]
struct State {
    books: HashMap<i32, Book>,
    customers: HashMap<i32, CustomerShort>,
    records: Vec<TrackingRecord>,
    next_record_id: i32,
}

impl State {
    fn most_recent(&self, book_id: i32) -> Option<&TrackingRecord> {
        self.records
            .iter()
            .filter(|r| r.book_id == book_id)
            .max_by_key(|r| (r.created_at, r.id))
    }

    fn set_book_state(&mut self, book_id: i32, expected_version: i32, state: BookState) -> AppResult<()> {
        let book = self
            .books
            .get_mut(&book_id)
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", book_id)))?;
        if book.version != expected_version {
            return Err(AppError::ConcurrentModification(format!(
                "Book {} was modified concurrently",
                book_id
            )));
        }
        book.status = state.status;
        book.due_date = state.due_date;
        book.version += 1;
        Ok(())
    }
}

/// Book store, tracking log and customer directory sharing one state
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn add_book(&self, id: i32) {
        let book = Book {
            id,
            title: format!("Book {}", id),
            author: "Unknown Author".to_string(),
            isbn: format!("isbn-{}", id),
            description: "Test book".to_string(),
            status: BookStatus::Available,
            due_date: None,
            version: 0,
            created_at: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            updated_at: None,
        };
        self.lock().books.insert(id, book);
    }

    pub fn add_customer(&self, id: i32, name: &str) {
        self.lock().customers.insert(
            id,
            CustomerShort {
                id,
                name: name.to_string(),
            },
        );
    }

    pub fn book(&self, id: i32) -> Book {
        self.lock().books[&id].clone()
    }

    pub fn records(&self) -> Vec<TrackingRecord> {
        self.lock().records.clone()
    }
}

#[async_trait]
impl BookStore for MemoryStore {
    async fn get(&self, id: i32) -> AppResult<Book> {
        let book = self
            .lock()
            .books
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)));
        // Let concurrent callers read the same snapshot before anyone writes
        tokio::task::yield_now().await;
        book
    }
}

#[async_trait]
impl TrackingLogStore for MemoryStore {
    async fn get(&self, id: i32) -> AppResult<Option<TrackingRecord>> {
        Ok(self.lock().records.iter().find(|r| r.id == id).cloned())
    }

    async fn most_recent_open(&self, book_id: i32) -> AppResult<Option<TrackingRecord>> {
        Ok(self
            .lock()
            .most_recent(book_id)
            .filter(|r| r.action == TrackingAction::CheckOut)
            .cloned())
    }

    async fn find_by_idempotency_key(
        &self,
        book_id: i32,
        key: &str,
    ) -> AppResult<Option<TrackingRecord>> {
        Ok(self
            .lock()
            .records
            .iter()
            .find(|r| r.book_id == book_id && r.idempotency_key.as_deref() == Some(key))
            .cloned())
    }

    async fn list_for_book(&self, book_id: i32, page: Page) -> AppResult<(Vec<TrackingRecord>, i64)> {
        let state = self.lock();
        let mut records: Vec<TrackingRecord> = state
            .records
            .iter()
            .filter(|r| r.book_id == book_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| std::cmp::Reverse((r.created_at, r.id)));
        let total = records.len() as i64;
        let items = records
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.per_page as usize)
            .collect();
        Ok((items, total))
    }

    async fn append(&self, commit: &TransitionCommit) -> AppResult<TrackingRecord> {
        let mut state = self.lock();
        if !state.customers.contains_key(&commit.customer_id) {
            return Err(AppError::NotFound(format!(
                "Customer with id {} not found",
                commit.customer_id
            )));
        }
        state.set_book_state(commit.book_id, commit.expected_version, commit.resulting_state())?;

        state.next_record_id += 1;
        let record = TrackingRecord {
            id: state.next_record_id,
            book_id: commit.book_id,
            customer_id: commit.customer_id,
            action: commit.action,
            due_date: commit.resulting_state().due_date,
            idempotency_key: commit.idempotency_key.clone(),
            created_at: commit.created_at,
            updated_at: None,
        };
        state.records.push(record.clone());
        Ok(record)
    }

    async fn correct(&self, correction: &TrackingCorrection) -> AppResult<TrackingRecord> {
        let mut state = self.lock();
        state.set_book_state(
            correction.book_id,
            correction.expected_version,
            BookState {
                status: BookStatus::CheckedOut,
                due_date: correction.due_date,
            },
        )?;
        let record = state
            .records
            .iter_mut()
            .find(|r| r.id == correction.record_id)
            .ok_or_else(|| {
                AppError::NotFound(format!("Tracking record {} not found", correction.record_id))
            })?;
        record.customer_id = correction.customer_id;
        record.due_date = correction.due_date;
        record.updated_at = Some(correction.updated_at);
        Ok(record.clone())
    }

    async fn delete(&self, id: i32) -> AppResult<Option<BookState>> {
        let mut state = self.lock();
        let Some(pos) = state.records.iter().position(|r| r.id == id) else {
            return Ok(None);
        };
        let removed = state.records.remove(pos);
        let derived = state
            .most_recent(removed.book_id)
            .map(|r| r.implied_book_state())
            .unwrap_or(BookState {
                status: BookStatus::Available,
                due_date: None,
            });
        let version = state.books[&removed.book_id].version;
        state.set_book_state(removed.book_id, version, derived)?;
        Ok(Some(derived))
    }
}

#[async_trait]
impl CustomerDirectory for MemoryStore {
    async fn exists(&self, id: i32) -> AppResult<bool> {
        Ok(self.lock().customers.contains_key(&id))
    }

    async fn get_short(&self, id: i32) -> AppResult<CustomerShort> {
        self.lock()
            .customers
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Customer with id {} not found", id)))
    }
}
