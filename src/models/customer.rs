//! Customer model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Customer (borrower) record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Customer {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Id and display name, used to attribute tracking records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CustomerShort {
    pub id: i32,
    pub name: String,
}

/// Create customer request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCustomer {
    #[validate(length(min = 3, message = "Name must be at least 3 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 3, message = "Phone must be at least 3 characters"))]
    pub phone: String,
}

/// Update customer request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCustomer {
    #[validate(length(min = 3, message = "Name must be at least 3 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(min = 3, message = "Phone must be at least 3 characters"))]
    pub phone: Option<String>,
}

/// Customer query parameters (also serves the tracking form's autocomplete)
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct CustomerQuery {
    /// Case-insensitive name search
    pub name: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
