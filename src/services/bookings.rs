//! Dining event bookings with race-safe capacity accounting.
//!
//! Capacity is claimed with a conditional decrement in the same
//! transaction as the booking insert, so two concurrent requests can
//! never oversell an event. Cancellation restores the claimed spots.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::dining_event::{self, Entity as DiningEvents};
use crate::entities::event_booking::{self, BookingStatus, Entity as EventBookings};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Request payload for booking spots at a dining event
#[derive(Clone, Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBookingInput {
    #[validate(length(min = 1, max = 200))]
    pub customer_name: String,
    #[validate(email)]
    pub customer_email: String,
    #[serde(default)]
    #[validate(length(max = 30))]
    pub customer_phone: Option<String>,
    #[validate(range(min = 1))]
    pub guest_count: i32,
}

#[derive(Clone)]
pub struct BookingService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl BookingService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Upcoming events, soonest first.
    pub async fn list_events(&self) -> Result<Vec<dining_event::Model>, ServiceError> {
        Ok(DiningEvents::find()
            .order_by_asc(dining_event::Column::StartsAt)
            .all(&*self.db)
            .await?)
    }

    pub async fn get_event(&self, event_id: Uuid) -> Result<dining_event::Model, ServiceError> {
        DiningEvents::find_by_id(event_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Dining event {} not found", event_id)))
    }

    /// Books spots at an event.
    ///
    /// The decrement only succeeds if enough spots remain at commit time;
    /// zero rows affected means the event is full (or gone).
    #[instrument(skip(self, input), fields(event_id = %event_id, guest_count = input.guest_count))]
    pub async fn create_booking(
        &self,
        event_id: Uuid,
        input: &CreateBookingInput,
    ) -> Result<event_booking::Model, ServiceError> {
        input.validate()?;

        let txn = self.db.begin().await?;
        let claimed = DiningEvents::update_many()
            .col_expr(
                dining_event::Column::AvailableSpots,
                Expr::col(dining_event::Column::AvailableSpots).sub(input.guest_count),
            )
            .filter(dining_event::Column::Id.eq(event_id))
            .filter(dining_event::Column::AvailableSpots.gte(input.guest_count))
            .exec(&txn)
            .await?;

        if claimed.rows_affected == 0 {
            txn.rollback().await?;
            return if DiningEvents::find_by_id(event_id)
                .one(&*self.db)
                .await?
                .is_some()
            {
                Err(ServiceError::CapacityExceeded(format!(
                    "Event {} does not have {} spots available",
                    event_id, input.guest_count
                )))
            } else {
                Err(ServiceError::NotFound(format!(
                    "Dining event {} not found",
                    event_id
                )))
            };
        }

        let booking = event_booking::ActiveModel {
            id: Set(Uuid::new_v4()),
            event_id: Set(event_id),
            customer_name: Set(input.customer_name.trim().to_string()),
            customer_email: Set(input.customer_email.trim().to_string()),
            customer_phone: Set(input.customer_phone.clone()),
            guest_count: Set(input.guest_count),
            status: Set(BookingStatus::Pending),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::BookingCreated(booking.id))
            .await;
        info!(booking_id = %booking.id, "Booking created");
        Ok(booking)
    }

    pub async fn get_booking(
        &self,
        booking_id: Uuid,
    ) -> Result<event_booking::Model, ServiceError> {
        EventBookings::find_by_id(booking_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Booking {} not found", booking_id)))
    }

    /// Confirms a pending booking.
    #[instrument(skip(self), fields(booking_id = %booking_id))]
    pub async fn confirm_booking(
        &self,
        booking_id: Uuid,
    ) -> Result<event_booking::Model, ServiceError> {
        let booking = self.get_booking(booking_id).await?;
        if booking.status != BookingStatus::Pending {
            return Err(ServiceError::InvalidOperation(format!(
                "Booking {} is '{}', only pending bookings can be confirmed",
                booking_id, booking.status
            )));
        }

        let mut active: event_booking::ActiveModel = booking.into();
        active.status = Set(BookingStatus::Confirmed);
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::BookingConfirmed(booking_id))
            .await;
        Ok(updated)
    }

    /// Cancels a pending or confirmed booking, returning its spots to the
    /// event in the same transaction.
    #[instrument(skip(self), fields(booking_id = %booking_id))]
    pub async fn cancel_booking(
        &self,
        booking_id: Uuid,
    ) -> Result<event_booking::Model, ServiceError> {
        let booking = self.get_booking(booking_id).await?;
        if booking.status == BookingStatus::Cancelled {
            return Err(ServiceError::InvalidOperation(format!(
                "Booking {} is already cancelled",
                booking_id
            )));
        }

        let event_id = booking.event_id;
        let guest_count = booking.guest_count;

        let txn = self.db.begin().await?;
        let mut active: event_booking::ActiveModel = booking.into();
        active.status = Set(BookingStatus::Cancelled);
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&txn).await?;

        DiningEvents::update_many()
            .col_expr(
                dining_event::Column::AvailableSpots,
                Expr::col(dining_event::Column::AvailableSpots).add(guest_count),
            )
            .filter(dining_event::Column::Id.eq(event_id))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::BookingCancelled(booking_id))
            .await;
        info!(booking_id = %booking_id, "Booking cancelled, spots restored");
        Ok(updated)
    }
}
