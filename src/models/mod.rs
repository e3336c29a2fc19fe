//! # Data Models
//!
//! SeaORM entities for the tables the factory writes to.

pub mod customer;
pub mod ticket;

pub use customer::Entity as Customer;
pub use ticket::Entity as Ticket;
pub use ticket::TicketStatus;
