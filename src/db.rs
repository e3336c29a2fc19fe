//! Database connection management for the data factory.
//!
//! Opens a SeaORM connection pool to Postgres from the loaded
//! [`AppConfig`], pointing the session `search_path` at the configured
//! schema so entities resolve to the right tables.

use anyhow::{Context, Result};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use std::time::Duration;
use tokio::time::sleep;

use crate::config::AppConfig;

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {source}")]
    ConnectionFailed {
        #[from]
        source: sea_orm::DbErr,
    },
    #[error("Invalid database configuration: {message}")]
    InvalidConfiguration { message: String },
}

const MAX_CONNECT_ATTEMPTS: u32 = 5;

/// Initializes a database connection pool with the given configuration.
///
/// Transient connection failures are retried with exponential backoff,
/// starting at 100ms, for up to five attempts.
///
/// # Examples
///
/// ```no_run
/// use data_factory::{config::ConfigLoader, db::init_pool};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = ConfigLoader::new().load()?;
///     let db = init_pool(&config).await?;
///     // Use the database connection...
///     Ok(())
/// }
/// ```
pub async fn init_pool(cfg: &AppConfig) -> Result<DatabaseConnection> {
    let url = cfg
        .database
        .database_url()
        .context("building database url")?;

    let mut opt = connect_options(&url, &cfg.database.schema)?;
    opt.max_connections(cfg.db_max_connections)
        .acquire_timeout(Duration::from_millis(cfg.db_acquire_timeout_ms));

    let mut retry_delay = Duration::from_millis(100);
    let mut attempt = 1;

    loop {
        match Database::connect(opt.clone()).await {
            Ok(conn) => {
                log::info!(
                    "Connected to {}:{}/{} (schema {}, attempt {})",
                    cfg.database.host,
                    cfg.database.port,
                    cfg.database.name,
                    cfg.database.schema,
                    attempt
                );
                return Ok(conn);
            }
            Err(e) if attempt >= MAX_CONNECT_ATTEMPTS => {
                log::error!(
                    "Failed to connect to database after {} attempts: {}",
                    MAX_CONNECT_ATTEMPTS,
                    e
                );
                return Err(DatabaseError::ConnectionFailed { source: e }.into());
            }
            Err(e) => {
                log::warn!(
                    "Database connection attempt {} failed: {}, retrying in {:?}",
                    attempt,
                    e,
                    retry_delay
                );

                sleep(retry_delay).await;
                retry_delay *= 2;
                attempt += 1;
            }
        }
    }
}

/// Opens a single connection to an explicit URL.
///
/// `schema` sets the Postgres `search_path`; SQLite ignores it.
pub async fn connect_url(url: &str, schema: Option<&str>) -> Result<DatabaseConnection> {
    let opt = connect_options(url, schema.unwrap_or_default())?;
    Database::connect(opt)
        .await
        .map_err(|source| DatabaseError::ConnectionFailed { source }.into())
}

fn connect_options(url: &str, schema: &str) -> Result<ConnectOptions> {
    if url.is_empty() {
        return Err(DatabaseError::InvalidConfiguration {
            message: "Database URL cannot be empty".to_string(),
        }
        .into());
    }

    let mut opt = ConnectOptions::new(url);
    opt.idle_timeout(Duration::from_secs(600))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);
    if !schema.is_empty() && url.starts_with("postgres") {
        opt.set_schema_search_path(schema);
    }
    Ok(opt)
}

/// Verifies that the connection is alive by executing `SELECT 1`.
pub async fn health_check(db: &DatabaseConnection) -> Result<()> {
    use sea_orm::Statement;

    let stmt = Statement::from_string(db.get_database_backend(), "SELECT 1".to_string());

    db.query_one(stmt)
        .await
        .context("Database health check failed")?;

    Ok(())
}
