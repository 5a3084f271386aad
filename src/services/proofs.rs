//! Payment proof submission and review.
//!
//! Proofs only apply to peer-payment orders waiting in `pending_payment`.
//! The artifact must land in object storage before anything is recorded;
//! a storage failure blocks the submission outright.

use bytes::Bytes;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::order::{self, Entity as Orders, OrderStatus, PaymentStatus};
use crate::entities::payment_proof::{self, Entity as PaymentProofs, ProofStatus};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::order_status::validate_transition;
use crate::services::storage::ObjectStorage;

#[derive(Clone)]
pub struct ProofService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    storage: Arc<dyn ObjectStorage>,
}

impl ProofService {
    pub fn new(
        db: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        storage: Arc<dyn ObjectStorage>,
    ) -> Self {
        Self {
            db,
            event_sender,
            storage,
        }
    }

    /// Uploads a proof artifact and records it for review.
    ///
    /// The order moves to `pending_verification` payment status; its
    /// fulfillment status is untouched until a reviewer approves.
    #[instrument(skip(self, bytes, comments), fields(order_id = %order_id, size = bytes.len()))]
    pub async fn submit_proof(
        &self,
        order_id: Uuid,
        bytes: Bytes,
        content_type: &str,
        comments: Option<String>,
    ) -> Result<payment_proof::Model, ServiceError> {
        if bytes.is_empty() {
            return Err(ServiceError::ValidationError(
                "Proof file must not be empty".into(),
            ));
        }

        let order = Orders::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;
        if !order.payment_method.is_manual() {
            return Err(ServiceError::InvalidOperation(format!(
                "Order {} does not use a peer payment method",
                order_id
            )));
        }
        if order.status != OrderStatus::PendingPayment {
            return Err(ServiceError::InvalidOperation(format!(
                "Order {} is not awaiting a payment proof (status '{}')",
                order_id, order.status
            )));
        }

        let proof_id = Uuid::new_v4();
        let extension = extension_for(content_type);
        let path = format!("orders/{}/{}{}", order_id, proof_id, extension);
        // Nothing is recorded unless the artifact is durably stored.
        let file_url = self.storage.upload(&path, bytes, content_type).await?;

        let txn = self.db.begin().await?;
        let proof = payment_proof::ActiveModel {
            id: Set(proof_id),
            order_id: Set(order_id),
            file_url: Set(file_url),
            content_type: Set(Some(content_type.to_string())),
            comments: Set(comments),
            status: Set(ProofStatus::Pending),
            review_comments: Set(None),
            created_at: Set(Utc::now()),
            reviewed_at: Set(None),
        }
        .insert(&txn)
        .await?;

        let mut active: order::ActiveModel = order.into();
        active.payment_status = Set(PaymentStatus::PendingVerification);
        active.updated_at = Set(Some(Utc::now()));
        active.update(&txn).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::ProofSubmitted {
                proof_id,
                order_id,
            })
            .await;
        info!(proof_id = %proof_id, "Payment proof submitted");
        Ok(proof)
    }

    /// Review queue listing, oldest submissions first.
    pub async fn list_proofs(
        &self,
        status: Option<ProofStatus>,
    ) -> Result<Vec<payment_proof::Model>, ServiceError> {
        let mut select = PaymentProofs::find().order_by_asc(payment_proof::Column::CreatedAt);
        if let Some(status) = status {
            select = select.filter(payment_proof::Column::Status.eq(status));
        }
        Ok(select.all(&*self.db).await?)
    }

    pub async fn get_proof(&self, proof_id: Uuid) -> Result<payment_proof::Model, ServiceError> {
        PaymentProofs::find_by_id(proof_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Payment proof {} not found", proof_id)))
    }

    /// Approves a pending proof: the payment is confirmed and the order
    /// enters fulfillment, all in one transaction.
    #[instrument(skip(self), fields(proof_id = %proof_id))]
    pub async fn approve_proof(
        &self,
        proof_id: Uuid,
    ) -> Result<payment_proof::Model, ServiceError> {
        let (proof, order) = self.load_pending_proof(proof_id).await?;
        validate_transition(order.status, OrderStatus::PaymentConfirmed, order.order_type)?;

        let order_id = order.id;
        let now = Utc::now();

        let txn = self.db.begin().await?;
        let mut active_proof: payment_proof::ActiveModel = proof.into();
        active_proof.status = Set(ProofStatus::Approved);
        active_proof.reviewed_at = Set(Some(now));
        let updated = active_proof.update(&txn).await?;

        let mut active_order: order::ActiveModel = order.into();
        active_order.payment_status = Set(PaymentStatus::Confirmed);
        active_order.status = Set(OrderStatus::PaymentConfirmed);
        active_order.updated_at = Set(Some(now));
        active_order.update(&txn).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::ProofApproved {
                proof_id,
                order_id,
            })
            .await;
        self.event_sender
            .send_or_log(Event::OrderPaymentConfirmed(order_id))
            .await;
        info!(proof_id = %proof_id, order_id = %order_id, "Payment proof approved");
        Ok(updated)
    }

    /// Rejects a pending proof with reviewer comments. The order drops
    /// back to `unpaid` and the customer may submit a new proof.
    #[instrument(skip(self, review_comments), fields(proof_id = %proof_id))]
    pub async fn reject_proof(
        &self,
        proof_id: Uuid,
        review_comments: Option<String>,
    ) -> Result<payment_proof::Model, ServiceError> {
        let (proof, order) = self.load_pending_proof(proof_id).await?;
        let order_id = order.id;
        let now = Utc::now();

        let txn = self.db.begin().await?;
        let mut active_proof: payment_proof::ActiveModel = proof.into();
        active_proof.status = Set(ProofStatus::Rejected);
        active_proof.review_comments = Set(review_comments);
        active_proof.reviewed_at = Set(Some(now));
        let updated = active_proof.update(&txn).await?;

        let mut active_order: order::ActiveModel = order.into();
        active_order.payment_status = Set(PaymentStatus::Unpaid);
        active_order.updated_at = Set(Some(now));
        active_order.update(&txn).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::ProofRejected {
                proof_id,
                order_id,
            })
            .await;
        info!(proof_id = %proof_id, order_id = %order_id, "Payment proof rejected");
        Ok(updated)
    }

    async fn load_pending_proof(
        &self,
        proof_id: Uuid,
    ) -> Result<(payment_proof::Model, order::Model), ServiceError> {
        let proof = self.get_proof(proof_id).await?;
        if proof.status != ProofStatus::Pending {
            return Err(ServiceError::InvalidOperation(format!(
                "Payment proof {} has already been reviewed",
                proof_id
            )));
        }
        let order = Orders::find_by_id(proof.order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Order {} not found", proof.order_id))
            })?;
        Ok((proof, order))
    }
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => ".png",
        "image/jpeg" => ".jpg",
        "image/webp" => ".webp",
        "application/pdf" => ".pdf",
        _ => "",
    }
}
