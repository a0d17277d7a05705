//! Customer management service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        customer::{CreateCustomer, CustomerQuery, UpdateCustomer},
        Customer, Page,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CustomersService {
    repository: Repository,
}

impl CustomersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn search(&self, query: &CustomerQuery, page: Page) -> AppResult<(Vec<Customer>, i64)> {
        self.repository.customers.search(query, page).await
    }

    pub async fn get(&self, id: i32) -> AppResult<Customer> {
        self.repository.customers.get_by_id(id).await
    }

    pub async fn create(&self, data: &CreateCustomer) -> AppResult<Customer> {
        data.validate()?;
        let customer = self.repository.customers.create(data).await?;
        tracing::info!(customer_id = customer.id, "Created customer");
        Ok(customer)
    }

    pub async fn update(&self, id: i32, data: &UpdateCustomer) -> AppResult<Customer> {
        data.validate()?;
        self.repository.customers.update(id, data).await
    }

    /// Delete a customer who appears in no tracking record
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        // Verify customer exists
        self.repository.customers.get_by_id(id).await?;

        let history = self.repository.customers.count_tracking(id).await?;
        if history > 0 {
            return Err(AppError::BusinessRule(format!(
                "Customer {} appears in {} tracking record(s) and cannot be deleted",
                id, history
            )));
        }

        self.repository.customers.delete(id).await
    }
}
