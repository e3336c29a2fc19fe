//! Database seeding
//!
//! One routine per entity type: generate a batch in memory, then write it
//! with a single transactional upsert.

pub mod customer;
pub mod ticket;

pub use customer::seed_customers;
pub use ticket::seed_tickets;
