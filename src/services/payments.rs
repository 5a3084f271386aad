//! Card payment routing and webhook reconciliation.
//!
//! Card checkouts create the order first, then the hosted session, so a
//! paid session always has an order to reconcile against. Webhook
//! deliveries are verified with an HMAC signature and are idempotent:
//! replays of a completed event are acknowledged without a second write.

use chrono::Utc;
use hmac::{Hmac, Mac};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait};
use serde::Deserialize;
use sha2::Sha256;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::order::{self, Entity as Orders, OrderStatus, PaymentStatus};
use crate::entities::order_item;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::hosted_checkout::HostedCheckoutClient;
use crate::services::order_status::validate_transition;

type HmacSha256 = Hmac<Sha256>;

/// Webhook envelope delivered by the checkout processor.
#[derive(Clone, Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookEventData,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WebhookEventData {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub order_id: Option<Uuid>,
    #[serde(default)]
    pub metadata: Option<WebhookMetadata>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WebhookMetadata {
    #[serde(default)]
    pub order_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct PaymentService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    checkout: Arc<HostedCheckoutClient>,
}

impl PaymentService {
    pub fn new(
        db: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        checkout: Arc<HostedCheckoutClient>,
    ) -> Self {
        Self {
            db,
            event_sender,
            checkout,
        }
    }

    /// Creates a hosted checkout session for a freshly created card order
    /// and records the session reference. If the processor refuses the
    /// session the provisional order is cancelled before the error
    /// propagates, so no orphaned `awaiting_payment` rows accumulate.
    #[instrument(skip(self, order, items), fields(order_id = %order.id))]
    pub async fn start_card_payment(
        &self,
        order: order::Model,
        items: &[order_item::Model],
    ) -> Result<String, ServiceError> {
        match self.checkout.create_checkout_session(&order, items).await {
            Ok(session) => {
                let order_id = order.id;
                let mut active: order::ActiveModel = order.into();
                active.external_payment_ref = Set(Some(session.session_id.clone()));
                active.updated_at = Set(Some(Utc::now()));
                active.update(&*self.db).await?;
                info!(order_id = %order_id, session_id = %session.session_id, "Card payment session started");
                Ok(session.redirect_url)
            }
            Err(err) => {
                // The customer never saw this order, so no cancellation
                // notification goes out.
                let order_id = order.id;
                let mut active: order::ActiveModel = order.into();
                active.status = Set(OrderStatus::Cancelled);
                active.updated_at = Set(Some(Utc::now()));
                active.update(&*self.db).await?;
                warn!(order_id = %order_id, "Provisional order cancelled after session failure");
                Err(err)
            }
        }
    }

    /// Applies a verified webhook event to the matching order.
    ///
    /// Unknown references and replays are acknowledged without error so
    /// the processor stops retrying.
    #[instrument(skip(self, event), fields(event_type = %event.event_type))]
    pub async fn handle_webhook_event(&self, event: &WebhookEvent) -> Result<(), ServiceError> {
        match event.event_type.as_str() {
            "checkout.completed" => self.apply_checkout_completed(event).await,
            "payment.failed" => self.apply_payment_failed(event).await,
            other => {
                debug!(event_type = %other, "Ignoring unhandled webhook event type");
                Ok(())
            }
        }
    }

    async fn apply_checkout_completed(&self, event: &WebhookEvent) -> Result<(), ServiceError> {
        let Some(order) = self.find_order(&event.data).await? else {
            warn!(
                session_id = ?event.data.session_id,
                "Webhook references no known order; acknowledging"
            );
            return Ok(());
        };

        if order.payment_status == PaymentStatus::Confirmed {
            debug!(order_id = %order.id, "Payment already confirmed; webhook replay ignored");
            return Ok(());
        }
        if let Err(err) = validate_transition(
            order.status,
            OrderStatus::PaymentConfirmed,
            order.order_type,
        ) {
            warn!(
                order_id = %order.id,
                status = %order.status,
                "Order cannot accept payment confirmation: {}; acknowledging",
                err
            );
            return Ok(());
        }

        let order_id = order.id;
        let session_id = event.data.session_id.clone();

        let txn = self.db.begin().await?;
        let mut active: order::ActiveModel = order.into();
        active.payment_status = Set(PaymentStatus::Confirmed);
        active.status = Set(OrderStatus::PaymentConfirmed);
        // Matched via metadata fallback: backfill the missing reference.
        if let Some(session_id) = session_id {
            active.external_payment_ref = Set(Some(session_id));
        }
        active.updated_at = Set(Some(Utc::now()));
        active.update(&txn).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::OrderPaymentConfirmed(order_id))
            .await;
        info!(order_id = %order_id, "Payment confirmed via webhook");
        Ok(())
    }

    async fn apply_payment_failed(&self, event: &WebhookEvent) -> Result<(), ServiceError> {
        let Some(order) = self.find_order(&event.data).await? else {
            warn!(
                session_id = ?event.data.session_id,
                "Payment failure references no known order; acknowledging"
            );
            return Ok(());
        };

        // The order stays awaiting_payment so the customer can retry.
        let order_id = order.id;
        let mut active: order::ActiveModel = order.into();
        active.payment_status = Set(PaymentStatus::Failed);
        active.updated_at = Set(Some(Utc::now()));
        active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::OrderPaymentFailed(order_id))
            .await;
        info!(order_id = %order_id, "Payment failure recorded");
        Ok(())
    }

    /// Resolves the order a webhook refers to: the session reference is
    /// authoritative, the order id carried in metadata is the fallback.
    async fn find_order(
        &self,
        data: &WebhookEventData,
    ) -> Result<Option<order::Model>, ServiceError> {
        if let Some(session_id) = &data.session_id {
            let found = Orders::find()
                .filter(order::Column::ExternalPaymentRef.eq(session_id.as_str()))
                .one(&*self.db)
                .await?;
            if found.is_some() {
                return Ok(found);
            }
        }

        let fallback_id = data
            .order_id
            .or_else(|| data.metadata.as_ref().and_then(|m| m.order_id));
        if let Some(order_id) = fallback_id {
            return Ok(Orders::find_by_id(order_id).one(&*self.db).await?);
        }
        Ok(None)
    }
}

/// Verifies a webhook delivery signature.
///
/// The signature is HMAC-SHA256 over `"{timestamp}.{body}"`, hex-encoded.
/// Comparison is constant-time via the MAC verifier, and timestamps
/// outside the tolerance window are rejected to bound replay.
pub fn verify_webhook_signature(
    secret: &str,
    timestamp: &str,
    body: &[u8],
    signature_hex: &str,
    tolerance_secs: i64,
) -> Result<(), ServiceError> {
    let ts: i64 = timestamp
        .parse()
        .map_err(|_| ServiceError::Unauthorized("invalid webhook timestamp".into()))?;
    if (Utc::now().timestamp() - ts).abs() > tolerance_secs {
        return Err(ServiceError::Unauthorized(
            "webhook timestamp outside tolerance window".into(),
        ));
    }

    let signature = hex::decode(signature_hex)
        .map_err(|_| ServiceError::Unauthorized("malformed webhook signature".into()))?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| ServiceError::Unauthorized("invalid webhook secret".into()))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(body);
    mac.verify_slice(&signature)
        .map_err(|_| ServiceError::Unauthorized("webhook signature mismatch".into()))
}
