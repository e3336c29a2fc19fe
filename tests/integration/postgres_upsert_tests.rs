//! Upsert tests against a real Postgres instance.
//!
//! Exercises the configured schema `search_path` and Postgres conflict
//! handling, which SQLite cannot cover.

use anyhow::Result;
use chrono::{TimeZone, Utc};
use data_factory::config::{AppConfig, load_database_settings};
use data_factory::db;
use data_factory::generators::{CustomerFactory, TicketFactory};
use data_factory::repositories::{CustomerRepository, TicketRepository};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use testcontainers_modules::{postgres::Postgres, testcontainers::runners::AsyncRunner};

const SCHEMA_SQL: &[&str] = &[
    "CREATE SCHEMA eshop",
    r#"CREATE TABLE eshop.customers (
        customer_id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        surname TEXT NOT NULL,
        username TEXT NOT NULL,
        is_active BOOLEAN NOT NULL,
        time_created TIMESTAMPTZ NOT NULL,
        time_updated TIMESTAMPTZ,
        age INTEGER NOT NULL CHECK (age BETWEEN 18 AND 100)
    )"#,
    r#"CREATE TABLE eshop.tickets (
        ticket_id UUID PRIMARY KEY,
        active BOOLEAN NOT NULL,
        time_created TIMESTAMPTZ NOT NULL,
        time_assigned TIMESTAMPTZ NOT NULL,
        time_closed TIMESTAMPTZ,
        status TEXT NOT NULL,
        success_rate INTEGER,
        needed_call BOOLEAN NOT NULL
    )"#,
];

async fn execute(db: &DatabaseConnection, sql: &str) -> Result<()> {
    db.execute(Statement::from_string(db.get_database_backend(), sql.to_string()))
        .await?;
    Ok(())
}

async fn count(db: &DatabaseConnection, table: &str) -> Result<i64> {
    let row = db
        .query_one(Statement::from_string(
            db.get_database_backend(),
            format!("SELECT COUNT(*) AS n FROM eshop.{table}"),
        ))
        .await?
        .expect("count row");
    Ok(row.try_get("", "n")?)
}

/// Loads the connection through the YAML setup file, as the binary does.
fn config_for(port: u16, dir: &TempDir) -> Result<AppConfig> {
    let path = dir.path().join("db_setup.yaml");
    fs::write(
        &path,
        "database:\n  host: 127.0.0.1\n  port: $PG_PORT\n  name: postgres\n  schema:\n    name: eshop\n  users:\n    rw_username: $PG_USER\n    rw_password: $PG_PASSWORD\n",
    )?;
    let vars = BTreeMap::from([
        ("PG_PORT".to_string(), port.to_string()),
        ("PG_USER".to_string(), "postgres".to_string()),
        ("PG_PASSWORD".to_string(), "postgres".to_string()),
    ]);

    Ok(AppConfig {
        profile: "test".to_string(),
        log_level: "info".to_string(),
        log_format: "json".to_string(),
        db_setup_path: path.clone(),
        db_max_connections: 2,
        db_acquire_timeout_ms: 5000,
        database: load_database_settings(&path, &vars)?,
    })
}

#[tokio::test]
#[ignore = "requires docker"]
async fn upserts_into_configured_schema() -> Result<()> {
    let container = Postgres::default().start().await?;
    let port = container.get_host_port_ipv4(5432).await?;
    let dir = TempDir::new()?;
    let config = config_for(port, &dir)?;

    let db = db::init_pool(&config).await?;
    db::health_check(&db).await?;
    for sql in SCHEMA_SQL {
        execute(&db, sql).await?;
    }

    let customers = CustomerRepository::new(Arc::new(db.clone()));
    let batch = CustomerFactory::from_seed(21).create_customers(50);
    customers.upsert_batch(batch.clone()).await?;
    customers.upsert_batch(batch).await?;
    assert_eq!(count(&db, "customers").await?, 50);

    let now = Utc.with_ymd_and_hms(2023, 3, 12, 0, 0, 0).unwrap();
    let tickets = TicketFactory::from_seed(4)?.generate_until(now);
    let expected = tickets.len() as i64;
    TicketRepository::new(Arc::new(db.clone()))
        .upsert_batch(tickets)
        .await?;
    assert_eq!(count(&db, "tickets").await?, expected);
    Ok(())
}

#[tokio::test]
#[ignore = "requires docker"]
async fn check_violation_rolls_back_on_postgres() -> Result<()> {
    let container = Postgres::default().start().await?;
    let port = container.get_host_port_ipv4(5432).await?;
    let dir = TempDir::new()?;
    let config = config_for(port, &dir)?;

    let db = db::init_pool(&config).await?;
    for sql in SCHEMA_SQL {
        execute(&db, sql).await?;
    }

    let mut batch = CustomerFactory::from_seed(8).create_customers(20);
    batch[19].age = 150;
    let err = CustomerRepository::new(Arc::new(db.clone()))
        .upsert_batch(batch)
        .await
        .expect_err("check constraint rejects the batch");

    assert!(err.is_constraint_violation());
    assert_eq!(count(&db, "customers").await?, 0);
    Ok(())
}
