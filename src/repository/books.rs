//! Books repository for database operations

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookRow, CreateBook, UpdateBook},
        BookStatusFilter, Page,
    },
};

use super::BookStore;

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

/// WHERE clause shared by the book list and the books export.
/// Placeholders are numbered title first, then the reference date for DELAYED.
pub(crate) fn books_where_clause(has_title: bool, status: Option<BookStatusFilter>) -> String {
    let mut conditions = Vec::new();

    if has_title {
        conditions.push("title ILIKE $1".to_string());
    }
    let date_idx = if has_title { 2 } else { 1 };
    match status {
        Some(BookStatusFilter::Available) => conditions.push("status = 'AVAILABLE'".to_string()),
        Some(BookStatusFilter::CheckedOut) => conditions.push("status = 'CHECKED_OUT'".to_string()),
        Some(BookStatusFilter::Delayed) => conditions.push(format!(
            "status = 'CHECKED_OUT' AND due_date < ${}",
            date_idx
        )),
        None => {}
    }

    if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    }
}

pub(crate) fn search_pattern(title: Option<&str>) -> Option<String> {
    title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| format!("%{}%", t))
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, BookRow>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?
            .try_into()
    }

    /// Search books with optional title/status filters.
    /// `today` is the reference day for the DELAYED filter.
    pub async fn search(
        &self,
        title: Option<&str>,
        status: Option<BookStatusFilter>,
        today: NaiveDate,
        page: Option<Page>,
    ) -> AppResult<(Vec<Book>, i64)> {
        let pattern = search_pattern(title);
        let where_clause = books_where_clause(pattern.is_some(), status);
        let delayed = status == Some(BookStatusFilter::Delayed);

        // Count total
        let count_q = format!("SELECT COUNT(*) FROM books {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_q);
        if let Some(ref p) = pattern { count_builder = count_builder.bind(p); }
        if delayed { count_builder = count_builder.bind(today); }
        let total = count_builder.fetch_one(&self.pool).await?;

        // Fetch rows
        let limit = match page {
            Some(p) => format!("LIMIT {} OFFSET {}", p.per_page, p.offset()),
            None => String::new(),
        };
        let select_q = format!(
            "SELECT * FROM books {} ORDER BY title, id {}",
            where_clause, limit
        );
        let mut builder = sqlx::query_as::<_, BookRow>(&select_q);
        if let Some(ref p) = pattern { builder = builder.bind(p); }
        if delayed { builder = builder.bind(today); }

        let books = builder
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Book::try_from)
            .collect::<AppResult<Vec<_>>>()?;

        Ok((books, total))
    }

    /// Create a book; it starts AVAILABLE with no due date
    pub async fn create(&self, data: &CreateBook) -> AppResult<Book> {
        sqlx::query_as::<_, BookRow>(
            r#"
            INSERT INTO books (title, author, isbn, description, status, due_date, version, created_at)
            VALUES ($1, $2, $3, $4, 'AVAILABLE', NULL, 0, $5)
            RETURNING *
            "#,
        )
        .bind(data.title.trim())
        .bind(data.author.trim())
        .bind(data.isbn.trim())
        .bind(data.description.trim())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?
        .try_into()
    }

    /// Update descriptive fields. Status and due date belong to the tracking workflow.
    pub async fn update(&self, id: i32, data: &UpdateBook) -> AppResult<Book> {
        sqlx::query_as::<_, BookRow>(
            r#"
            UPDATE books SET
                title = COALESCE($1, title),
                author = COALESCE($2, author),
                isbn = COALESCE($3, isbn),
                description = COALESCE($4, description),
                updated_at = $5
            WHERE id = $6
            RETURNING *
            "#,
        )
        .bind(data.title.as_deref().map(str::trim))
        .bind(data.author.as_deref().map(str::trim))
        .bind(data.isbn.as_deref().map(str::trim))
        .bind(data.description.as_deref().map(str::trim))
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?
        .try_into()
    }

    /// Delete a book together with its tracking history
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl BookStore for BooksRepository {
    async fn get(&self, id: i32) -> AppResult<Book> {
        self.get_by_id(id).await
    }
}
