//! API handlers for Shelfdesk REST endpoints

pub mod books;
pub mod customers;
pub mod health;
pub mod openapi;
pub mod reports;
pub mod tracking;

use axum::http::HeaderMap;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::{BookDetails, Customer},
};

/// Header carrying a caller-chosen key that makes a POST safe to retry
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Paginated response wrapper
#[derive(Serialize, ToSchema)]
#[aliases(PaginatedBooks = PaginatedResponse<BookDetails>, PaginatedCustomers = PaginatedResponse<Customer>)]
pub struct PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// List of items
    pub items: Vec<T>,
    /// Total number of items
    pub total: i64,
    /// Current page number
    pub page: i64,
    /// Items per page
    pub per_page: i64,
}

/// Read the idempotency key header, if any
pub(crate) fn idempotency_key(headers: &HeaderMap) -> AppResult<Option<String>> {
    match headers.get(IDEMPOTENCY_KEY_HEADER) {
        None => Ok(None),
        Some(value) => {
            let key = value
                .to_str()
                .map_err(|_| AppError::BadRequest("Idempotency-Key must be ASCII".to_string()))?
                .trim();
            if key.is_empty() || key.len() > 255 {
                return Err(AppError::BadRequest(
                    "Idempotency-Key must be 1 to 255 characters".to_string(),
                ));
            }
            Ok(Some(key.to_string()))
        }
    }
}
