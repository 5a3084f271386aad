use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::services::notifications::NotificationDispatcher;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the channel is down.
    /// Used after commits where the state change must not be rolled back
    /// because a notification could not be queued.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event.clone()).await {
            warn!("Dropping event {:?}: {}", event, e);
        }
    }
}

// Define the various events that can occur in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Cart events
    CartCreated(Uuid),
    CartUpdated { cart_id: Uuid, item_count: u64 },
    CartCleared(Uuid),

    // Order events
    OrderPlaced(Uuid),
    OrderPaymentConfirmed(Uuid),
    OrderPaymentFailed(Uuid),
    OrderStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },
    OrderCancelled(Uuid),

    // Payment proof events
    ProofSubmitted { proof_id: Uuid, order_id: Uuid },
    ProofApproved { proof_id: Uuid, order_id: Uuid },
    ProofRejected { proof_id: Uuid, order_id: Uuid },

    // Event booking events
    BookingCreated(Uuid),
    BookingConfirmed(Uuid),
    BookingCancelled(Uuid),

    // Generic event for custom messages
    Generic {
        message: String,
        timestamp: DateTime<Utc>,
        metadata: serde_json::Value,
    },
}

impl Event {
    /// Create a generic event with string data
    pub fn with_data(data: String) -> Self {
        Event::Generic {
            message: data,
            timestamp: Utc::now(),
            metadata: serde_json::Value::Null,
        }
    }
}

/// Processes incoming events and fans them out to customer notifications.
///
/// Notification failures are logged and swallowed; an undeliverable email
/// never fails the state change that produced the event.
pub async fn process_events(mut rx: mpsc::Receiver<Event>, dispatcher: Arc<NotificationDispatcher>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        info!("Received event: {:?}", event);

        let result = match &event {
            Event::OrderPlaced(order_id) => dispatcher.order_placed(*order_id).await,
            Event::OrderPaymentConfirmed(order_id) => {
                dispatcher.order_confirmed(*order_id).await
            }
            Event::OrderPaymentFailed(order_id) => dispatcher.payment_failed(*order_id).await,
            Event::OrderStatusChanged {
                order_id,
                new_status,
                ..
            } => dispatcher.order_status_changed(*order_id, new_status).await,
            Event::OrderCancelled(order_id) => dispatcher.order_cancelled(*order_id).await,
            Event::ProofSubmitted { order_id, .. } => dispatcher.proof_received(*order_id).await,
            Event::ProofRejected { order_id, .. } => dispatcher.proof_rejected(*order_id).await,
            Event::BookingCreated(booking_id) => dispatcher.booking_created(*booking_id).await,
            Event::BookingConfirmed(booking_id) => {
                dispatcher.booking_confirmed(*booking_id).await
            }
            Event::BookingCancelled(booking_id) => {
                dispatcher.booking_cancelled(*booking_id).await
            }
            // Cart activity and proof approvals (covered by the payment
            // confirmation email) produce no customer mail.
            _ => Ok(()),
        };

        if let Err(e) = result {
            warn!("Notification for event {:?} failed: {}", event, e);
        }
    }

    info!("Event processing loop stopped");
}
