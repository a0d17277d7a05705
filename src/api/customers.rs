//! Customer endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        customer::{CreateCustomer, CustomerQuery, UpdateCustomer},
        Customer, Page,
    },
};

use super::PaginatedResponse;

/// List customers, optionally filtered by name
#[utoipa::path(
    get,
    path = "/customers",
    tag = "customers",
    params(CustomerQuery),
    responses(
        (status = 200, description = "List of customers", body = PaginatedCustomers)
    )
)]
pub async fn list_customers(
    State(state): State<crate::AppState>,
    Query(query): Query<CustomerQuery>,
) -> AppResult<Json<PaginatedResponse<Customer>>> {
    let page = Page::resolve(query.page, query.per_page, &state.config.pagination);
    let (customers, total) = state.services.customers.search(&query, page).await?;

    Ok(Json(PaginatedResponse {
        items: customers,
        total,
        page: page.page,
        per_page: page.per_page,
    }))
}

/// Get customer by ID
#[utoipa::path(
    get,
    path = "/customers/{id}",
    tag = "customers",
    params(
        ("id" = i32, Path, description = "Customer ID")
    ),
    responses(
        (status = 200, description = "Customer details", body = Customer),
        (status = 404, description = "Customer not found")
    )
)]
pub async fn get_customer(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Customer>> {
    let customer = state.services.customers.get(id).await?;
    Ok(Json(customer))
}

/// Create a new customer
#[utoipa::path(
    post,
    path = "/customers",
    tag = "customers",
    request_body = CreateCustomer,
    responses(
        (status = 201, description = "Customer created", body = Customer),
        (status = 400, description = "Invalid input")
    )
)]
pub async fn create_customer(
    State(state): State<crate::AppState>,
    Json(data): Json<CreateCustomer>,
) -> AppResult<(StatusCode, Json<Customer>)> {
    let customer = state.services.customers.create(&data).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// Update a customer
#[utoipa::path(
    put,
    path = "/customers/{id}",
    tag = "customers",
    params(
        ("id" = i32, Path, description = "Customer ID")
    ),
    request_body = UpdateCustomer,
    responses(
        (status = 200, description = "Customer updated", body = Customer),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Customer not found")
    )
)]
pub async fn update_customer(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
    Json(data): Json<UpdateCustomer>,
) -> AppResult<Json<Customer>> {
    let customer = state.services.customers.update(id, &data).await?;
    Ok(Json(customer))
}

/// Delete a customer
#[utoipa::path(
    delete,
    path = "/customers/{id}",
    tag = "customers",
    params(
        ("id" = i32, Path, description = "Customer ID")
    ),
    responses(
        (status = 204, description = "Customer deleted"),
        (status = 404, description = "Customer not found"),
        (status = 422, description = "Customer appears in the tracking history")
    )
)]
pub async fn delete_customer(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.customers.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
