//! Customer entity model
//!
//! SeaORM entity for the `customers` table. Rows are produced by
//! [`crate::generators::CustomerFactory`] and written with
//! [`crate::repositories::CustomerRepository::upsert_batch`].

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// Customer entity representing a synthetic shop customer
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "customers")]
pub struct Model {
    /// Unique identifier (primary key, upsert conflict key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub customer_id: Uuid,

    /// First name
    pub name: String,

    /// Last name
    pub surname: String,

    pub username: String,

    /// Whether the customer account is active
    pub is_active: bool,

    /// Timestamp when the customer was created
    pub time_created: DateTimeWithTimeZone,

    /// Timestamp of the last update, never set by the generator
    pub time_updated: Option<DateTimeWithTimeZone>,

    /// Age in years
    pub age: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
