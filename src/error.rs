//! # Error Handling
//!
//! Storage-write errors raised by the bulk upsert. A failed batch is always
//! rolled back before one of these is returned, so the error describes the
//! whole batch rather than individual rows.

use sea_orm::{DbErr, RuntimeErr};
use thiserror::Error;

/// Failure while writing a batch to storage.
#[derive(Debug, Error)]
pub enum UpsertError {
    #[error("failed to open a transaction for {table}: {source}")]
    Begin {
        table: String,
        #[source]
        source: DbErr,
    },
    #[error("failed to bulk upsert {rows} row(s) into {table}: {source}")]
    Write {
        table: String,
        rows: usize,
        #[source]
        source: DbErr,
    },
    #[error("failed to commit {rows} row(s) into {table}: {source}")]
    Commit {
        table: String,
        rows: usize,
        #[source]
        source: DbErr,
    },
}

impl UpsertError {
    /// The underlying database error.
    pub fn db_err(&self) -> &DbErr {
        match self {
            UpsertError::Begin { source, .. }
            | UpsertError::Write { source, .. }
            | UpsertError::Commit { source, .. } => source,
        }
    }

    /// Whether the batch was rejected by a table constraint.
    pub fn is_constraint_violation(&self) -> bool {
        is_constraint_violation(self.db_err())
    }
}

/// Recognizes unique, check, not-null and foreign-key violations on Postgres
/// and SQLite.
pub fn is_constraint_violation(error: &DbErr) -> bool {
    // Postgres class 23 covers every integrity constraint violation.
    const PG_INTEGRITY_CLASS: &str = "23";
    // SQLITE_CONSTRAINT and its extended codes
    const SQLITE_CONSTRAINT_CODES: &[&str] = &["19", "275", "531", "787", "1299", "1555", "2067"];

    let runtime_err = match error {
        DbErr::Query(RuntimeErr::SqlxError(sqlx_err))
        | DbErr::Exec(RuntimeErr::SqlxError(sqlx_err)) => sqlx_err,
        _ => return false,
    };

    let Some(db_error) = runtime_err.as_database_error() else {
        return false;
    };

    if db_error.is_unique_violation()
        || db_error.is_check_violation()
        || db_error.is_foreign_key_violation()
    {
        return true;
    }

    if let Some(code) = db_error.code() {
        let code = code.as_ref();
        return (code.len() == 5 && code.starts_with(PG_INTEGRITY_CLASS))
            || SQLITE_CONSTRAINT_CODES.contains(&code);
    }

    false
}
