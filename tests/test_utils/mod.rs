//! Test utilities for database testing.
//!
//! Builds in-memory SQLite databases with the `customers` and `tickets`
//! tables derived from the entity definitions.

use anyhow::Result;
use data_factory::models::{Customer, Ticket};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema, Statement};
use std::sync::Arc;

/// Sets up an in-memory SQLite database with both tables created.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    create_table(&db, Customer).await?;
    create_table(&db, Ticket).await?;
    Ok(db)
}

/// Sets up an in-memory SQLite database and returns an Arc.
#[allow(dead_code)]
pub async fn setup_test_db_arc() -> Result<Arc<DatabaseConnection>> {
    let db = setup_test_db().await?;
    Ok(Arc::new(db))
}

/// Sets up an in-memory SQLite database whose `customers` table rejects
/// ages outside 18..=100.
#[allow(dead_code)]
pub async fn setup_checked_customer_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"CREATE TABLE customers (
            customer_id BLOB NOT NULL PRIMARY KEY,
            name TEXT NOT NULL,
            surname TEXT NOT NULL,
            username TEXT NOT NULL,
            is_active BOOLEAN NOT NULL,
            time_created TEXT NOT NULL,
            time_updated TEXT NULL,
            age INTEGER NOT NULL CHECK (age BETWEEN 18 AND 100)
        )"#
        .to_string(),
    ))
    .await?;
    Ok(db)
}

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, entity: E) -> Result<()> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    let stmt = schema.create_table_from_entity(entity);
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}
