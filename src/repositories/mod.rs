//! # Repository Layer
//!
//! Repositories encapsulate SeaORM operations for the factory's tables. All
//! writes go through [`upsert::bulk_upsert`].

pub mod customer;
pub mod ticket;
pub mod upsert;

pub use customer::CustomerRepository;
pub use ticket::TicketRepository;
pub use upsert::bulk_upsert;
