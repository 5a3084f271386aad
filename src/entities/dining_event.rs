use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Dining event entity
///
/// `available_spots` is the live allocation counter; bookings decrement
/// it atomically and cancellations restore it.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "dining_events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(nullable)]
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub capacity: i32,
    pub available_spots: i32,
    pub created_at: DateTime<Utc>,
    #[sea_orm(nullable)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::event_booking::Entity")]
    EventBookings,
}

impl Related<super::event_booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EventBookings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
