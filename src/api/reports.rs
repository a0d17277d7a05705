//! Dashboard and export endpoints

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::{report::BooksReportQuery, BookDetails, BooksMetrics},
};

/// Book counters for the dashboard
#[utoipa::path(
    get,
    path = "/reports/books-metrics",
    tag = "reports",
    responses(
        (status = 200, description = "Counters by status", body = BooksMetrics)
    )
)]
pub async fn books_metrics(State(state): State<crate::AppState>) -> AppResult<Json<BooksMetrics>> {
    let metrics = state.services.reports.books_metrics().await?;
    Ok(Json(metrics))
}

/// All books matching the filters, unpaginated
#[utoipa::path(
    get,
    path = "/reports/books",
    tag = "reports",
    params(BooksReportQuery),
    responses(
        (status = 200, description = "Matching books", body = Vec<BookDetails>)
    )
)]
pub async fn books_report(
    State(state): State<crate::AppState>,
    Query(query): Query<BooksReportQuery>,
) -> AppResult<Json<Vec<BookDetails>>> {
    let books = state.services.reports.books_report(&query).await?;
    Ok(Json(books))
}
