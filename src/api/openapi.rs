//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, customers, health, reports, tracking};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Shelfdesk API",
        version = "1.0.0",
        description = "Book check-out / check-in tracking REST API"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Tracking
        books::get_next_action,
        tracking::list_tracking,
        tracking::create_tracking,
        tracking::update_tracking,
        tracking::delete_tracking,
        tracking::get_tracking,
        // Customers
        customers::list_customers,
        customers::get_customer,
        customers::create_customer,
        customers::update_customer,
        customers::delete_customer,
        // Reports
        reports::books_metrics,
        reports::books_report,
    ),
    components(
        schemas(
            // Books
            crate::models::Book,
            crate::models::BookDetails,
            crate::models::BookStatus,
            crate::models::BookStatusFilter,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            crate::api::PaginatedBooks,
            // Tracking
            crate::models::TrackingAction,
            crate::models::TrackingRecord,
            crate::models::TrackingDetails,
            crate::models::tracking::TrackingEntry,
            crate::services::tracking::NextAction,
            tracking::CreateTrackingRequest,
            tracking::UpdateTrackingRequest,
            tracking::TrackingHistoryResponse,
            tracking::DeleteTrackingResponse,
            // Customers
            crate::models::Customer,
            crate::models::CustomerShort,
            crate::models::customer::CreateCustomer,
            crate::models::customer::UpdateCustomer,
            crate::api::PaginatedCustomers,
            // Reports
            crate::models::BooksMetrics,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Book catalog management"),
        (name = "tracking", description = "Check-out / check-in workflow"),
        (name = "customers", description = "Customer management"),
        (name = "reports", description = "Dashboard counters and exports")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
