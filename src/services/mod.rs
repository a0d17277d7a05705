//! Business logic services

pub mod books;
pub mod clock;
pub mod customers;
pub mod reports;
pub mod tracking;

use std::sync::Arc;

use crate::repository::Repository;

use clock::Clock;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub books: books::BooksService,
    pub customers: customers::CustomersService,
    pub tracking: tracking::TrackingService,
    pub reports: reports::ReportsService,
}

impl Services {
    /// Create all services with the given repository and time source
    pub fn new(repository: Repository, clock: Arc<dyn Clock>) -> Self {
        let tracking = tracking::TrackingService::new(
            Arc::new(repository.books.clone()),
            Arc::new(repository.tracking.clone()),
            Arc::new(repository.customers.clone()),
            clock.clone(),
        );

        Self {
            books: books::BooksService::new(repository.clone(), clock.clone()),
            customers: customers::CustomersService::new(repository.clone()),
            tracking,
            reports: reports::ReportsService::new(repository, clock),
        }
    }
}
