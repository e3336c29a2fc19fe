//! Customer seeding functionality

use anyhow::{Context, Result};
use rand::Rng;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing::info;

use crate::generators::CustomerFactory;
use crate::repositories::CustomerRepository;

/// Generates `count` customers and upserts them.
///
/// # Returns
///
/// Returns the number of customers written
pub async fn seed_customers<R: Rng>(
    db: &DatabaseConnection,
    factory: &mut CustomerFactory<R>,
    count: usize,
) -> Result<usize> {
    let repo = CustomerRepository::new(Arc::new(db.clone()));

    let customers = factory.create_customers(count);
    info!(count = customers.len(), "generated customers");

    let written = customers.len();
    repo.upsert_batch(customers)
        .await
        .context("seeding customers")?;

    info!(count = written, "customer seeding completed");
    Ok(written)
}
