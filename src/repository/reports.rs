//! Aggregate counters for the dashboard

use chrono::NaiveDate;
use sqlx::{Pool, Postgres, Row};

use crate::{error::AppResult, models::BooksMetrics};

#[derive(Clone)]
pub struct ReportsRepository {
    pool: Pool<Postgres>,
}

impl ReportsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Book counters by status; `delayed` uses `today` as the reference day
    pub async fn books_metrics(&self, today: NaiveDate) -> AppResult<BooksMetrics> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status = 'AVAILABLE') AS available,
                COUNT(*) FILTER (WHERE status = 'CHECKED_OUT') AS checkedout,
                COUNT(*) FILTER (WHERE status = 'CHECKED_OUT' AND due_date < $1) AS delayed,
                COUNT(*) AS total_books,
                (SELECT COUNT(*) FROM customers) AS total_customers
            FROM books
            "#,
        )
        .bind(today)
        .fetch_one(&self.pool)
        .await?;

        Ok(BooksMetrics {
            available: row.get("available"),
            checkedout: row.get("checkedout"),
            delayed: row.get("delayed"),
            total_books: row.get("total_books"),
            total_customers: row.get("total_customers"),
        })
    }

    /// Round-trip to the database
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
