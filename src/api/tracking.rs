//! Checkout/return (tracking) endpoints

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::{
        tracking::{EditTracking, RecordTransition, TrackingEntry, TrackingQuery},
        BookDetails, BookStatus, Page, TrackingAction, TrackingDetails, TrackingRecord,
    },
};

use super::idempotency_key;

/// Check-out / check-in request.
/// The admin client sends camelCase field names; both spellings are accepted.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTrackingRequest {
    /// Optional, must match the book in the path when present
    #[serde(alias = "bookId")]
    pub book_id: Option<i32>,
    #[serde(alias = "customerId")]
    pub customer_id: i32,
    /// Must be the book's next action
    pub action: TrackingAction,
    /// Required for CHECK_OUT (YYYY-MM-DD), ignored for CHECK_IN
    #[serde(alias = "dueDate")]
    pub due_date: Option<NaiveDate>,
    /// Alternative to the Idempotency-Key header
    #[serde(alias = "idempotencyKey")]
    pub idempotency_key: Option<String>,
}

/// Correction of the open tracking record
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTrackingRequest {
    #[serde(alias = "bookId")]
    pub book_id: Option<i32>,
    #[serde(alias = "customerId")]
    pub customer_id: Option<i32>,
    #[serde(alias = "dueDate")]
    pub due_date: Option<NaiveDate>,
    /// Accepted only if unchanged
    pub action: Option<TrackingAction>,
}

/// Tracking history of one book
#[derive(Serialize, ToSchema)]
pub struct TrackingHistoryResponse {
    pub book: BookDetails,
    pub items: Vec<TrackingEntry>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

/// Book state after a tracking record was deleted
#[derive(Serialize, ToSchema)]
pub struct DeleteTrackingResponse {
    pub book_id: i32,
    pub status: BookStatus,
    pub due_date: Option<NaiveDate>,
}

fn ensure_same_book(path_id: i32, body_id: Option<i32>) -> AppResult<()> {
    match body_id {
        Some(id) if id != path_id => Err(AppError::BadRequest(format!(
            "book_id {} does not match the book in the path ({})",
            id, path_id
        ))),
        _ => Ok(()),
    }
}

/// List a book's tracking history
#[utoipa::path(
    get,
    path = "/books/{id}/tracking",
    tag = "tracking",
    params(
        ("id" = i32, Path, description = "Book ID"),
        TrackingQuery
    ),
    responses(
        (status = 200, description = "Tracking history, newest first", body = TrackingHistoryResponse),
        (status = 404, description = "Book not found")
    )
)]
pub async fn list_tracking(
    State(state): State<crate::AppState>,
    Path(book_id): Path<i32>,
    Query(query): Query<TrackingQuery>,
) -> AppResult<Json<TrackingHistoryResponse>> {
    let page = Page::resolve(query.page, query.per_page, &state.config.pagination);
    let (book, items, total) = state.services.tracking.history(book_id, page).await?;

    Ok(Json(TrackingHistoryResponse {
        book,
        items,
        total,
        page: page.page,
        per_page: page.per_page,
    }))
}

/// Check a book out or in
#[utoipa::path(
    post,
    path = "/books/{id}/tracking",
    tag = "tracking",
    params(
        ("id" = i32, Path, description = "Book ID"),
        ("Idempotency-Key" = Option<String>, Header, description = "Makes retries safe")
    ),
    request_body = CreateTrackingRequest,
    responses(
        (status = 201, description = "Transition recorded", body = TrackingRecord),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Book or customer not found"),
        (status = 409, description = "Illegal transition or concurrent modification")
    )
)]
pub async fn create_tracking(
    State(state): State<crate::AppState>,
    Path(book_id): Path<i32>,
    headers: HeaderMap,
    Json(request): Json<CreateTrackingRequest>,
) -> AppResult<(StatusCode, Json<TrackingRecord>)> {
    ensure_same_book(book_id, request.book_id)?;

    let key = idempotency_key(&headers)?.or(request.idempotency_key);
    let record = state
        .services
        .tracking
        .record_transition(
            book_id,
            RecordTransition {
                customer_id: request.customer_id,
                action: request.action,
                due_date: request.due_date,
                idempotency_key: key,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// Correct the customer or due date of the open tracking record
#[utoipa::path(
    patch,
    path = "/books/{id}/tracking/{tracking_id}",
    tag = "tracking",
    params(
        ("id" = i32, Path, description = "Book ID"),
        ("tracking_id" = i32, Path, description = "Tracking record ID")
    ),
    request_body = UpdateTrackingRequest,
    responses(
        (status = 200, description = "Record corrected", body = TrackingRecord),
        (status = 404, description = "Record or customer not found"),
        (status = 409, description = "Record is not the open checkout, or concurrent modification")
    )
)]
pub async fn update_tracking(
    State(state): State<crate::AppState>,
    Path((book_id, tracking_id)): Path<(i32, i32)>,
    Json(request): Json<UpdateTrackingRequest>,
) -> AppResult<Json<TrackingRecord>> {
    ensure_same_book(book_id, request.book_id)?;

    let record = state.services.tracking.record_for_book(book_id, tracking_id).await?;
    if let Some(action) = request.action {
        if action != record.action {
            return Err(AppError::IllegalTransition(format!(
                "Tracking record {} is a {}; its action cannot be changed",
                tracking_id, record.action
            )));
        }
    }

    let updated = state
        .services
        .tracking
        .edit_open_tracking(
            tracking_id,
            EditTracking {
                customer_id: request.customer_id,
                due_date: request.due_date,
            },
        )
        .await?;

    Ok(Json(updated))
}

/// Delete a tracking record and re-derive the book's status
#[utoipa::path(
    delete,
    path = "/books/{id}/tracking/{tracking_id}",
    tag = "tracking",
    params(
        ("id" = i32, Path, description = "Book ID"),
        ("tracking_id" = i32, Path, description = "Tracking record ID")
    ),
    responses(
        (status = 200, description = "Record deleted", body = DeleteTrackingResponse),
        (status = 404, description = "Record not found")
    )
)]
pub async fn delete_tracking(
    State(state): State<crate::AppState>,
    Path((book_id, tracking_id)): Path<(i32, i32)>,
) -> AppResult<Json<DeleteTrackingResponse>> {
    state.services.tracking.record_for_book(book_id, tracking_id).await?;
    let book_state = state.services.tracking.delete_tracking(tracking_id).await?;

    Ok(Json(DeleteTrackingResponse {
        book_id,
        status: book_state.status,
        due_date: book_state.due_date,
    }))
}

/// Get a tracking record with its customer and book
#[utoipa::path(
    get,
    path = "/tracking/{id}",
    tag = "tracking",
    params(
        ("id" = i32, Path, description = "Tracking record ID")
    ),
    responses(
        (status = 200, description = "Tracking record", body = TrackingDetails),
        (status = 404, description = "Record not found")
    )
)]
pub async fn get_tracking(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<TrackingDetails>> {
    let details = state.services.tracking.get_details(id).await?;
    Ok(Json(details))
}
