//! Tracking repository: checkout/return history and the book state it drives

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::{
        tracking::{TrackingCorrection, TrackingRow, TransitionCommit},
        BookState, BookStatus, Page, TrackingAction, TrackingRecord,
    },
};

use super::TrackingLogStore;

const MOST_RECENT_SQL: &str = r#"
    SELECT * FROM tracking
    WHERE book_id = $1
    ORDER BY created_at DESC, id DESC
    LIMIT 1
"#;

#[derive(Clone)]
pub struct TrackingRepository {
    pool: Pool<Postgres>,
}

/// Map constraint violations raised while inserting/updating tracking rows
fn map_write_error(e: sqlx::Error, book_id: i32, customer_id: i32) -> AppError {
    if let sqlx::Error::Database(ref db) = e {
        if db.is_unique_violation() {
            return AppError::ConcurrentModification(format!(
                "A transition with this idempotency key is already being recorded for book {}",
                book_id
            ));
        }
        if db.is_foreign_key_violation() {
            return AppError::NotFound(format!("Customer with id {} not found", customer_id));
        }
    }
    AppError::Database(e)
}

/// Apply a new state to a book if its version still matches
async fn update_book_state(
    tx: &mut Transaction<'_, Postgres>,
    book_id: i32,
    expected_version: i32,
    state: BookState,
) -> AppResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE books
        SET status = $1, due_date = $2, version = version + 1, updated_at = $3
        WHERE id = $4 AND version = $5
        "#,
    )
    .bind(state.status.as_str())
    .bind(state.due_date)
    .bind(Utc::now())
    .bind(book_id)
    .bind(expected_version)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        tracing::warn!(book_id, expected_version, "Book version moved, rejecting write");
        return Err(AppError::ConcurrentModification(format!(
            "Book {} was modified concurrently",
            book_id
        )));
    }
    Ok(())
}

impl TrackingRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn most_recent(&self, book_id: i32) -> AppResult<Option<TrackingRecord>> {
        sqlx::query_as::<_, TrackingRow>(MOST_RECENT_SQL)
            .bind(book_id)
            .fetch_optional(&self.pool)
            .await?
            .map(TrackingRecord::try_from)
            .transpose()
    }
}

#[async_trait]
impl TrackingLogStore for TrackingRepository {
    async fn get(&self, id: i32) -> AppResult<Option<TrackingRecord>> {
        sqlx::query_as::<_, TrackingRow>("SELECT * FROM tracking WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(TrackingRecord::try_from)
            .transpose()
    }

    async fn most_recent_open(&self, book_id: i32) -> AppResult<Option<TrackingRecord>> {
        Ok(self
            .most_recent(book_id)
            .await?
            .filter(|r| r.action == TrackingAction::CheckOut))
    }

    async fn find_by_idempotency_key(
        &self,
        book_id: i32,
        key: &str,
    ) -> AppResult<Option<TrackingRecord>> {
        sqlx::query_as::<_, TrackingRow>(
            "SELECT * FROM tracking WHERE book_id = $1 AND idempotency_key = $2",
        )
        .bind(book_id)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?
        .map(TrackingRecord::try_from)
        .transpose()
    }

    async fn list_for_book(&self, book_id: i32, page: Page) -> AppResult<(Vec<TrackingRecord>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tracking WHERE book_id = $1")
            .bind(book_id)
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, TrackingRow>(
            r#"
            SELECT * FROM tracking
            WHERE book_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(book_id)
        .bind(page.per_page)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let records = rows
            .into_iter()
            .map(TrackingRecord::try_from)
            .collect::<AppResult<Vec<_>>>()?;
        Ok((records, total))
    }

    async fn append(&self, commit: &TransitionCommit) -> AppResult<TrackingRecord> {
        let mut tx = self.pool.begin().await?;

        update_book_state(&mut tx, commit.book_id, commit.expected_version, commit.resulting_state())
            .await?;

        let due_date = match commit.action {
            TrackingAction::CheckOut => commit.due_date,
            TrackingAction::CheckIn => None,
        };

        let row = sqlx::query_as::<_, TrackingRow>(
            r#"
            INSERT INTO tracking (book_id, customer_id, action, due_date, idempotency_key, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(commit.book_id)
        .bind(commit.customer_id)
        .bind(commit.action.as_str())
        .bind(due_date)
        .bind(&commit.idempotency_key)
        .bind(commit.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, commit.book_id, commit.customer_id))?;

        tx.commit().await?;
        row.try_into()
    }

    async fn correct(&self, correction: &TrackingCorrection) -> AppResult<TrackingRecord> {
        let mut tx = self.pool.begin().await?;

        update_book_state(
            &mut tx,
            correction.book_id,
            correction.expected_version,
            BookState {
                status: BookStatus::CheckedOut,
                due_date: correction.due_date,
            },
        )
        .await?;

        let row = sqlx::query_as::<_, TrackingRow>(
            r#"
            UPDATE tracking SET customer_id = $1, due_date = $2, updated_at = $3
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(correction.customer_id)
        .bind(correction.due_date)
        .bind(correction.updated_at)
        .bind(correction.record_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, correction.book_id, correction.customer_id))?
        .ok_or_else(|| {
            AppError::NotFound(format!("Tracking record {} not found", correction.record_id))
        })?;

        tx.commit().await?;
        row.try_into()
    }

    async fn delete(&self, id: i32) -> AppResult<Option<BookState>> {
        let mut tx = self.pool.begin().await?;

        let book_id: Option<i32> = sqlx::query_scalar("SELECT book_id FROM tracking WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(book_id) = book_id else {
            return Ok(None);
        };

        // Lock the book so no transition interleaves with the re-derivation
        let version: i32 = sqlx::query_scalar("SELECT version FROM books WHERE id = $1 FOR UPDATE")
            .bind(book_id)
            .fetch_one(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM tracking WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        // A concurrent delete got the lock first
        if deleted.rows_affected() == 0 {
            return Ok(None);
        }

        let remaining = sqlx::query_as::<_, TrackingRow>(MOST_RECENT_SQL)
            .bind(book_id)
            .fetch_optional(&mut *tx)
            .await?
            .map(TrackingRecord::try_from)
            .transpose()?;

        let state = remaining
            .map(|r| r.implied_book_state())
            .unwrap_or(BookState {
                status: BookStatus::Available,
                due_date: None,
            });

        update_book_state(&mut tx, book_id, version, state).await?;
        tx.commit().await?;

        Ok(Some(state))
    }
}
