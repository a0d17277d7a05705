//! Book catalog service

use std::sync::Arc;

use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        book::{BookQuery, CreateBook, UpdateBook},
        BookDetails, Page,
    },
    repository::Repository,
};

use super::clock::Clock;

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
    clock: Arc<dyn Clock>,
}

impl BooksService {
    pub fn new(repository: Repository, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Search books with filters
    pub async fn search(&self, query: &BookQuery, page: Page) -> AppResult<(Vec<BookDetails>, i64)> {
        let now = self.clock.now();
        let (books, total) = self
            .repository
            .books
            .search(query.title.as_deref(), query.status, now.date_naive(), Some(page))
            .await?;
        let books = books.into_iter().map(|b| BookDetails::new(b, now)).collect();
        Ok((books, total))
    }

    pub async fn get(&self, id: i32) -> AppResult<BookDetails> {
        let book = self.repository.books.get_by_id(id).await?;
        Ok(BookDetails::new(book, self.clock.now()))
    }

    pub async fn create(&self, data: &CreateBook) -> AppResult<BookDetails> {
        data.validate()?;
        let book = self.repository.books.create(data).await?;
        tracing::info!(book_id = book.id, "Created book");
        Ok(BookDetails::new(book, self.clock.now()))
    }

    pub async fn update(&self, id: i32, data: &UpdateBook) -> AppResult<BookDetails> {
        data.validate()?;
        let book = self.repository.books.update(id, data).await?;
        Ok(BookDetails::new(book, self.clock.now()))
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!(book_id = id, "Deleted book and its tracking history");
        Ok(())
    }
}
