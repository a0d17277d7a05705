//! Dashboard counters and book exports

use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{report::BooksReportQuery, BookDetails, BooksMetrics},
    repository::Repository,
};

use super::clock::Clock;

#[derive(Clone)]
pub struct ReportsService {
    repository: Repository,
    clock: Arc<dyn Clock>,
}

impl ReportsService {
    pub fn new(repository: Repository, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    pub async fn books_metrics(&self) -> AppResult<BooksMetrics> {
        self.repository.reports.books_metrics(self.clock.today()).await
    }

    /// Every book matching the filters, unpaginated
    pub async fn books_report(&self, query: &BooksReportQuery) -> AppResult<Vec<BookDetails>> {
        let now = self.clock.now();
        let (books, _) = self
            .repository
            .books
            .search(query.title.as_deref(), query.status, now.date_naive(), None)
            .await?;
        Ok(books.into_iter().map(|b| BookDetails::new(b, now)).collect())
    }

    /// Fails when the database is unreachable
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.reports.ping().await
    }
}
