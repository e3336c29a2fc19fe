//! Customer repository for database operations
//!
//! Wraps the `customers` table: batch upsert for the seeding run plus the
//! reads used to report on it.

use anyhow::Result;
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder};
use std::sync::Arc;
use uuid::Uuid;

use super::upsert::bulk_upsert;
use crate::error::UpsertError;
use crate::models::customer::{self, Entity as Customer};

/// Repository for customer database operations
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
}

impl CustomerRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Inserts or overwrites every customer in one transaction.
    ///
    /// # Returns
    ///
    /// Returns the number of rows written, or an [`UpsertError`] after the
    /// whole batch has been rolled back
    pub async fn upsert_batch(&self, customers: Vec<customer::Model>) -> Result<u64, UpsertError> {
        bulk_upsert::<Customer>(&self.db, customers).await
    }

    /// Finds a customer by its identifier
    pub async fn find_by_id(&self, customer_id: Uuid) -> Result<Option<customer::Model>> {
        Ok(Customer::find_by_id(customer_id).one(&*self.db).await?)
    }

    /// Lists all customers, oldest first
    pub async fn find_all(&self) -> Result<Vec<customer::Model>> {
        let customers = Customer::find()
            .order_by_asc(customer::Column::TimeCreated)
            .order_by_asc(customer::Column::CustomerId)
            .all(&*self.db)
            .await?;
        Ok(customers)
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(Customer::find().count(&*self.db).await?)
    }
}
