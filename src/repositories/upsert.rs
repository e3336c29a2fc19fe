//! Generic insert-or-update for whole batches.
//!
//! Every row is inserted, or, when its primary key already exists, every
//! non-key column is overwritten with the incoming value. The batch runs in a
//! single transaction: it is committed as a whole or rolled back as a whole.

use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbErr, EntityName, EntityTrait, IdenStatic,
    IntoActiveModel, Iterable, PrimaryKeyToColumn, TransactionTrait,
};
use tracing::{debug, error, info, instrument, warn};

use crate::error::UpsertError;

/// Bind parameters allowed in one statement (SQLite's limit, below Postgres' 65535).
pub const MAX_BIND_PARAMS: usize = 32_766;

/// Upserts `models` into `E`'s table in one transaction.
///
/// Large batches are split into several statements so that none exceeds
/// [`MAX_BIND_PARAMS`]; they still share the transaction. Returns the number
/// of rows the database reports as inserted or updated. An empty batch is a
/// no-op.
#[instrument(skip_all, fields(table = %E::default().table_name(), rows = models.len()))]
pub async fn bulk_upsert<E>(
    db: &DatabaseConnection,
    models: Vec<E::Model>,
) -> Result<u64, UpsertError>
where
    E: EntityTrait,
    E::Model: IntoActiveModel<E::ActiveModel>,
{
    let table = E::default().table_name().to_string();
    let rows = models.len();

    if models.is_empty() {
        debug!("empty batch, nothing to write");
        return Ok(0);
    }

    let txn = db.begin().await.map_err(|source| UpsertError::Begin {
        table: table.clone(),
        source,
    })?;

    match write_chunks::<E, _>(&txn, models).await {
        Ok(affected) => {
            txn.commit().await.map_err(|source| UpsertError::Commit {
                table: table.clone(),
                rows,
                source,
            })?;
            info!(affected, "bulk upsert committed");
            Ok(affected)
        }
        Err(source) => {
            error!(error = %source, "bulk upsert failed, rolling back");
            if let Err(rollback_err) = txn.rollback().await {
                warn!(error = %rollback_err, "rollback failed");
            }
            Err(UpsertError::Write {
                table,
                rows,
                source,
            })
        }
    }
}

async fn write_chunks<E, C>(conn: &C, models: Vec<E::Model>) -> Result<u64, DbErr>
where
    E: EntityTrait,
    E::Model: IntoActiveModel<E::ActiveModel>,
    C: ConnectionTrait,
{
    let conflict = conflict_clause::<E>();
    let chunk_rows = rows_per_statement::<E>();
    let mut pending = models
        .into_iter()
        .map(IntoActiveModel::into_active_model)
        .peekable();
    let mut affected = 0;

    while pending.peek().is_some() {
        let chunk: Vec<E::ActiveModel> = pending.by_ref().take(chunk_rows).collect();
        debug!(chunk = chunk.len(), "writing chunk");
        affected += E::insert_many(chunk)
            .on_conflict(conflict.clone())
            .exec_without_returning(conn)
            .await?;
    }

    Ok(affected)
}

/// `ON CONFLICT (pk) DO UPDATE SET col = excluded.col` for every non-key column.
fn conflict_clause<E: EntityTrait>() -> OnConflict {
    let keys = primary_key_columns::<E>();
    let updates: Vec<E::Column> = E::Column::iter()
        .filter(|column| !keys.iter().any(|key| key.as_str() == column.as_str()))
        .collect();

    let mut clause = OnConflict::columns(keys);
    if updates.is_empty() {
        clause.do_nothing();
    } else {
        clause.update_columns(updates);
    }
    clause
}

fn primary_key_columns<E: EntityTrait>() -> Vec<E::Column> {
    E::PrimaryKey::iter()
        .map(PrimaryKeyToColumn::into_column)
        .collect()
}

fn rows_per_statement<E: EntityTrait>() -> usize {
    let columns = E::Column::iter().count().max(1);
    (MAX_BIND_PARAMS / columns).max(1)
}
