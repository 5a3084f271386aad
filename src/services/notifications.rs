//! Customer notification emails.
//!
//! The dispatcher sits behind the event channel: it loads the current
//! record, renders a short HTML message, and hands it to the configured
//! mail sender. Errors bubble up to the event loop, which logs them.

use sea_orm::EntityTrait;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::dining_event::Entity as DiningEvents;
use crate::entities::event_booking::{self, Entity as EventBookings};
use crate::entities::order::{self, Entity as Orders};
use crate::errors::ServiceError;
use crate::services::mail::MailSender;

pub struct NotificationDispatcher {
    db: Arc<DbPool>,
    mailer: Arc<dyn MailSender>,
}

impl NotificationDispatcher {
    pub fn new(db: Arc<DbPool>, mailer: Arc<dyn MailSender>) -> Self {
        Self { db, mailer }
    }

    #[instrument(skip(self))]
    pub async fn order_placed(&self, order_id: Uuid) -> Result<(), ServiceError> {
        let order = self.load_order(order_id).await?;
        let subject = format!("Order {} received", order.order_number);
        let body = format!(
            "<p>Hi {},</p>\
             <p>We've received your order <strong>{}</strong> for {} {}.</p>\
             <p>We'll let you know as soon as it moves along.</p>",
            order.customer_name, order.order_number, order.total_amount, order.currency
        );
        self.send(&order, &subject, &body).await
    }

    #[instrument(skip(self))]
    pub async fn order_confirmed(&self, order_id: Uuid) -> Result<(), ServiceError> {
        let order = self.load_order(order_id).await?;
        let subject = format!("Payment confirmed for order {}", order.order_number);
        let body = format!(
            "<p>Hi {},</p>\
             <p>Your payment of {} {} for order <strong>{}</strong> is confirmed. \
             The kitchen has it from here.</p>",
            order.customer_name, order.total_amount, order.currency, order.order_number
        );
        self.send(&order, &subject, &body).await
    }

    #[instrument(skip(self))]
    pub async fn payment_failed(&self, order_id: Uuid) -> Result<(), ServiceError> {
        let order = self.load_order(order_id).await?;
        let subject = format!("Payment problem with order {}", order.order_number);
        let body = format!(
            "<p>Hi {},</p>\
             <p>The payment for order <strong>{}</strong> did not go through. \
             You can retry the payment; your order is still reserved.</p>",
            order.customer_name, order.order_number
        );
        self.send(&order, &subject, &body).await
    }

    #[instrument(skip(self, new_status))]
    pub async fn order_status_changed(
        &self,
        order_id: Uuid,
        new_status: &str,
    ) -> Result<(), ServiceError> {
        let order = self.load_order(order_id).await?;
        let subject = format!("Order {} update", order.order_number);
        let body = format!(
            "<p>Hi {},</p>\
             <p>Your order <strong>{}</strong> is now <strong>{}</strong>.</p>",
            order.customer_name,
            order.order_number,
            new_status.replace('_', " ")
        );
        self.send(&order, &subject, &body).await
    }

    #[instrument(skip(self))]
    pub async fn order_cancelled(&self, order_id: Uuid) -> Result<(), ServiceError> {
        let order = self.load_order(order_id).await?;
        let subject = format!("Order {} cancelled", order.order_number);
        let body = format!(
            "<p>Hi {},</p>\
             <p>Your order <strong>{}</strong> has been cancelled. \
             If this wasn't expected, please get in touch.</p>",
            order.customer_name, order.order_number
        );
        self.send(&order, &subject, &body).await
    }

    #[instrument(skip(self))]
    pub async fn proof_received(&self, order_id: Uuid) -> Result<(), ServiceError> {
        let order = self.load_order(order_id).await?;
        let subject = format!("Payment proof received for order {}", order.order_number);
        let body = format!(
            "<p>Hi {},</p>\
             <p>We've received your payment proof for order <strong>{}</strong> \
             and will review it shortly.</p>",
            order.customer_name, order.order_number
        );
        self.send(&order, &subject, &body).await
    }

    #[instrument(skip(self))]
    pub async fn proof_rejected(&self, order_id: Uuid) -> Result<(), ServiceError> {
        let order = self.load_order(order_id).await?;
        let subject = format!("Payment proof needs another look ({})", order.order_number);
        let body = format!(
            "<p>Hi {},</p>\
             <p>We couldn't verify the payment proof for order <strong>{}</strong>. \
             Please check the reviewer comments and submit a new one.</p>",
            order.customer_name, order.order_number
        );
        self.send(&order, &subject, &body).await
    }

    #[instrument(skip(self))]
    pub async fn booking_created(&self, booking_id: Uuid) -> Result<(), ServiceError> {
        let (booking, event_name) = self.load_booking(booking_id).await?;
        let subject = format!("Booking request received: {}", event_name);
        let body = format!(
            "<p>Hi {},</p>\
             <p>We've received your booking for <strong>{}</strong> \
             ({} guest(s)). We'll confirm it shortly.</p>",
            booking.customer_name, event_name, booking.guest_count
        );
        self.send_to(&booking.customer_email, &subject, &body).await
    }

    #[instrument(skip(self))]
    pub async fn booking_confirmed(&self, booking_id: Uuid) -> Result<(), ServiceError> {
        let (booking, event_name) = self.load_booking(booking_id).await?;
        let subject = format!("Booking confirmed: {}", event_name);
        let body = format!(
            "<p>Hi {},</p>\
             <p>Your booking for <strong>{}</strong> ({} guest(s)) is confirmed. \
             See you there!</p>",
            booking.customer_name, event_name, booking.guest_count
        );
        self.send_to(&booking.customer_email, &subject, &body).await
    }

    #[instrument(skip(self))]
    pub async fn booking_cancelled(&self, booking_id: Uuid) -> Result<(), ServiceError> {
        let (booking, event_name) = self.load_booking(booking_id).await?;
        let subject = format!("Booking cancelled: {}", event_name);
        let body = format!(
            "<p>Hi {},</p>\
             <p>Your booking for <strong>{}</strong> has been cancelled and the \
             spots released.</p>",
            booking.customer_name, event_name
        );
        self.send_to(&booking.customer_email, &subject, &body).await
    }

    async fn send(
        &self,
        order: &order::Model,
        subject: &str,
        body: &str,
    ) -> Result<(), ServiceError> {
        self.send_to(&order.customer_email, subject, body).await
    }

    async fn send_to(&self, to: &str, subject: &str, body: &str) -> Result<(), ServiceError> {
        self.mailer.send(to, subject, body).await.map(|_| ())
    }

    async fn load_order(&self, order_id: Uuid) -> Result<order::Model, ServiceError> {
        Orders::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))
    }

    async fn load_booking(
        &self,
        booking_id: Uuid,
    ) -> Result<(event_booking::Model, String), ServiceError> {
        let booking = EventBookings::find_by_id(booking_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Booking {} not found", booking_id)))?;
        let event_name = DiningEvents::find_by_id(booking.event_id)
            .one(&*self.db)
            .await?
            .map(|event| event.name)
            .unwrap_or_else(|| "your dining event".to_string());
        Ok((booking, event_name))
    }
}
