//! Synthetic record generation
//!
//! Factories here build customer and ticket models entirely in memory. Every
//! factory draws from an injected random source, so seeding the RNG makes the
//! output, identifiers included, reproducible.

use rand::Rng;
use thiserror::Error;
use uuid::Uuid;

use crate::models::TicketStatus;

pub mod customer;
pub mod ticket;
pub mod weighted;

pub use customer::CustomerFactory;
pub use ticket::{TicketFactory, TicketOptions};
pub use weighted::WeightedTable;

/// Errors raised while building a generator from its options.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("weight table must contain at least one entry")]
    EmptyWeightTable,
    #[error("weights must be finite and non-negative, got {weight}")]
    InvalidWeight { weight: f64 },
    #[error("weights must not all be zero")]
    ZeroTotalWeight,
    #[error("{field} range is inverted (min: {min}, max: {max})")]
    InvertedRange {
        field: &'static str,
        min: i64,
        max: i64,
    },
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },
    #[error("{field} must be between 0.0 and 1.0, got {value}")]
    InvalidProbability { field: &'static str, value: f64 },
    #[error("{field} must be finite and not negative, got {value}")]
    Negative { field: &'static str, value: f64 },
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("{status:?} is an open-ticket status and cannot weight closed tickets")]
    OpenStatusForClosedTicket { status: TicketStatus },
}

/// Builds a version 4 UUID from the given random source.
pub(crate) fn random_uuid<R: Rng + ?Sized>(rng: &mut R) -> Uuid {
    uuid::Builder::from_random_bytes(rng.r#gen()).into_uuid()
}
