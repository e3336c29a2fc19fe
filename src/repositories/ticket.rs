//! Ticket repository for database operations

use anyhow::Result;
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder};
use std::sync::Arc;
use uuid::Uuid;

use super::upsert::bulk_upsert;
use crate::error::UpsertError;
use crate::models::ticket::{self, Entity as Ticket};

/// Repository for ticket database operations
#[derive(Debug, Clone)]
pub struct TicketRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
}

impl TicketRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Inserts or overwrites every ticket in one transaction.
    pub async fn upsert_batch(&self, tickets: Vec<ticket::Model>) -> Result<u64, UpsertError> {
        bulk_upsert::<Ticket>(&self.db, tickets).await
    }

    pub async fn find_by_id(&self, ticket_id: Uuid) -> Result<Option<ticket::Model>> {
        Ok(Ticket::find_by_id(ticket_id).one(&*self.db).await?)
    }

    /// Lists all tickets in creation order
    pub async fn find_all(&self) -> Result<Vec<ticket::Model>> {
        let tickets = Ticket::find()
            .order_by_asc(ticket::Column::TimeCreated)
            .order_by_asc(ticket::Column::TicketId)
            .all(&*self.db)
            .await?;
        Ok(tickets)
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(Ticket::find().count(&*self.db).await?)
    }
}
