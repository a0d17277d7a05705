//! Tracking (checkout/return history) model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::{
    book::{Book, BookState},
    customer::CustomerShort,
    enums::TrackingAction,
};
use crate::error::AppError;

/// Raw `tracking` row
#[derive(Debug, Clone, FromRow)]
pub struct TrackingRow {
    pub id: i32,
    pub book_id: i32,
    pub customer_id: i32,
    pub action: String,
    pub due_date: Option<NaiveDate>,
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One append-only entry of a book's circulation history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TrackingRecord {
    pub id: i32,
    pub book_id: i32,
    pub customer_id: i32,
    pub action: TrackingAction,
    /// Set for CHECK_OUT, always empty for CHECK_IN
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<TrackingRow> for TrackingRecord {
    type Error = AppError;

    fn try_from(row: TrackingRow) -> Result<Self, Self::Error> {
        let action = TrackingAction::try_from(row.action.as_str())
            .map_err(|e| AppError::InvalidState(format!("Tracking {}: {}", row.id, e)))?;
        Ok(TrackingRecord {
            id: row.id,
            book_id: row.book_id,
            customer_id: row.customer_id,
            action,
            due_date: row.due_date,
            idempotency_key: row.idempotency_key,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TrackingRecord {
    /// Book state implied when this record is the most recent one for its book
    pub fn implied_book_state(&self) -> BookState {
        match self.action {
            TrackingAction::CheckOut => BookState {
                status: self.action.resulting_status(),
                due_date: self.due_date,
            },
            TrackingAction::CheckIn => BookState {
                status: self.action.resulting_status(),
                due_date: None,
            },
        }
    }
}

/// Tracking record with its customer and book, for the detail screen
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TrackingDetails {
    #[serde(flatten)]
    pub record: TrackingRecord,
    pub customer: CustomerShort,
    pub book: Book,
}

/// History entry with the customer who performed it
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TrackingEntry {
    #[serde(flatten)]
    pub record: TrackingRecord,
    pub customer: CustomerShort,
}

/// Input of a checkout/return transition
#[derive(Debug, Clone, PartialEq)]
pub struct RecordTransition {
    pub customer_id: i32,
    pub action: TrackingAction,
    pub due_date: Option<NaiveDate>,
    /// Caller-supplied key making retries safe
    pub idempotency_key: Option<String>,
}

/// Correction of the book's open tracking record
#[derive(Debug, Clone, Default, PartialEq, Deserialize, ToSchema)]
pub struct EditTracking {
    pub customer_id: Option<i32>,
    pub due_date: Option<NaiveDate>,
}

/// Everything the store needs to persist a transition in one unit
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionCommit {
    pub book_id: i32,
    /// Book version read before validating the transition
    pub expected_version: i32,
    pub customer_id: i32,
    pub action: TrackingAction,
    pub due_date: Option<NaiveDate>,
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TransitionCommit {
    pub fn resulting_state(&self) -> BookState {
        BookState {
            status: self.action.resulting_status(),
            due_date: match self.action {
                TrackingAction::CheckOut => self.due_date,
                TrackingAction::CheckIn => None,
            },
        }
    }
}

/// Correction persisted together with the book's mirrored due date
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingCorrection {
    pub record_id: i32,
    pub book_id: i32,
    pub expected_version: i32,
    pub customer_id: i32,
    pub due_date: Option<NaiveDate>,
    pub updated_at: DateTime<Utc>,
}

/// Tracking history query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct TrackingQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
