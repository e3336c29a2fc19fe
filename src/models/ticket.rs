//! Ticket entity model
//!
//! SeaORM entity for the `tickets` table together with the string-backed
//! [`TicketStatus`] enum. A ticket's status domain depends on whether it is
//! still active.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// Lifecycle status of a support ticket
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum TicketStatus {
    #[sea_orm(string_value = "new")]
    New,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "waiting_for_customer")]
    WaitingForCustomer,
    #[sea_orm(string_value = "resolved")]
    Resolved,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    #[sea_orm(string_value = "need_development")]
    NeedDevelopment,
}

impl TicketStatus {
    /// Statuses an open ticket can be in
    pub const ACTIVE: [TicketStatus; 3] = [
        TicketStatus::New,
        TicketStatus::InProgress,
        TicketStatus::WaitingForCustomer,
    ];

    /// Statuses a closed ticket can be in
    pub const INACTIVE: [TicketStatus; 3] = [
        TicketStatus::Resolved,
        TicketStatus::Cancelled,
        TicketStatus::NeedDevelopment,
    ];

    /// Returns true if the status belongs to the open-ticket domain
    pub fn is_active(self) -> bool {
        Self::ACTIVE.contains(&self)
    }
}

/// Ticket entity representing a support ticket and its lifecycle timestamps
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tickets")]
pub struct Model {
    /// Unique identifier (primary key, upsert conflict key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub ticket_id: Uuid,

    /// Whether the ticket is still open
    pub active: bool,

    pub time_created: DateTimeWithTimeZone,

    /// When an agent picked the ticket up; never before `time_created`
    pub time_assigned: DateTimeWithTimeZone,

    /// Set iff the ticket is no longer active
    pub time_closed: Option<DateTimeWithTimeZone>,

    pub status: TicketStatus,

    /// Customer satisfaction score 1-5, set iff the ticket is no longer active
    pub success_rate: Option<i32>,

    /// Whether resolving the ticket required a call; always false for new tickets
    pub needed_call: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
