//! Ticket seeding functionality

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rand::Rng;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing::info;

use crate::generators::TicketFactory;
use crate::repositories::TicketRepository;

/// Generates the ticket history up to `now` and upserts it.
///
/// # Returns
///
/// Returns the number of tickets written
pub async fn seed_tickets<R: Rng>(
    db: &DatabaseConnection,
    factory: &mut TicketFactory<R>,
    now: DateTime<Utc>,
) -> Result<usize> {
    let repo = TicketRepository::new(Arc::new(db.clone()));

    let tickets = factory.generate_until(now);
    let open = tickets.iter().filter(|t| t.active).count();
    info!(
        count = tickets.len(),
        open,
        start = %factory.options().start,
        %now,
        "generated tickets"
    );

    let written = tickets.len();
    repo.upsert_batch(tickets).await.context("seeding tickets")?;

    info!(count = written, "ticket seeding completed");
    Ok(written)
}
