//! Customers repository for database operations

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        customer::{CreateCustomer, Customer, CustomerQuery, CustomerShort, UpdateCustomer},
        Page,
    },
};

use super::{books::search_pattern, CustomerDirectory};

#[derive(Clone)]
pub struct CustomersRepository {
    pool: Pool<Postgres>,
}

/// A tracking record inserted after the history check still holds the customer
fn map_delete_error(e: sqlx::Error, id: i32) -> AppError {
    if let sqlx::Error::Database(ref db) = e {
        if db.is_foreign_key_violation() {
            return AppError::BusinessRule(format!(
                "Customer {} appears in the tracking history and cannot be deleted",
                id
            ));
        }
    }
    AppError::Database(e)
}

impl CustomersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get customer by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Customer> {
        sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Customer with id {} not found", id)))
    }

    /// Search customers by name
    pub async fn search(&self, query: &CustomerQuery, page: Page) -> AppResult<(Vec<Customer>, i64)> {
        let pattern = search_pattern(query.name.as_deref());
        let where_clause = if pattern.is_some() { "WHERE name ILIKE $1" } else { "" };

        let count_q = format!("SELECT COUNT(*) FROM customers {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_q);
        if let Some(ref p) = pattern { count_builder = count_builder.bind(p); }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_q = format!(
            "SELECT * FROM customers {} ORDER BY name, id LIMIT {} OFFSET {}",
            where_clause,
            page.per_page,
            page.offset()
        );
        let mut builder = sqlx::query_as::<_, Customer>(&select_q);
        if let Some(ref p) = pattern { builder = builder.bind(p); }
        let customers = builder.fetch_all(&self.pool).await?;

        Ok((customers, total))
    }

    /// Create a customer
    pub async fn create(&self, data: &CreateCustomer) -> AppResult<Customer> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (name, email, phone, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(data.name.trim())
        .bind(data.email.trim())
        .bind(data.phone.trim())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(customer)
    }

    /// Update a customer
    pub async fn update(&self, id: i32, data: &UpdateCustomer) -> AppResult<Customer> {
        sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers SET
                name = COALESCE($1, name),
                email = COALESCE($2, email),
                phone = COALESCE($3, phone),
                updated_at = $4
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(data.name.as_deref().map(str::trim))
        .bind(data.email.as_deref().map(str::trim))
        .bind(data.phone.as_deref().map(str::trim))
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Customer with id {} not found", id)))
    }

    /// Number of tracking records attributed to a customer
    pub async fn count_tracking(&self, id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tracking WHERE customer_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Delete a customer
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_delete_error(e, id))?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Customer with id {} not found", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl CustomerDirectory for CustomersRepository {
    async fn exists(&self, id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM customers WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn get_short(&self, id: i32) -> AppResult<CustomerShort> {
        sqlx::query_as::<_, CustomerShort>("SELECT id, name FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Customer with id {} not found", id)))
    }
}
