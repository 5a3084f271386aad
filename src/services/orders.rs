//! Order factory and lifecycle operations.
//!
//! Orders are immutable snapshots of a converted cart. Totals are always
//! recomputed server-side from the snapshotted selections; client totals
//! are never trusted. Status writes all pass through the transition table
//! in `order_status`.

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::cart::{self, CartStatus, Entity as Carts};
use crate::entities::cart_item::{self, Entity as CartItems};
use crate::entities::order::{
    self, Entity as Orders, OrderStatus, OrderType, PaymentMethod, PaymentStatus,
};
use crate::entities::order_item::{self, Entity as OrderItems};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::order_status::validate_transition;
use crate::services::pricing;

/// Checkout request payload
#[derive(Clone, Debug, Deserialize, Validate, ToSchema)]
pub struct CheckoutInput {
    pub cart_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub customer_name: String,
    #[validate(email)]
    pub customer_email: String,
    #[validate(length(min = 7, max = 30))]
    pub customer_phone: String,
    pub order_type: OrderType,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub delivery_address: Option<String>,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// Admin listing filter
#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Clone)]
pub struct OrderService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    tax_rate: Decimal,
    delivery_fee: Decimal,
    currency: String,
    default_page_size: u64,
    max_page_size: u64,
}

impl OrderService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        tax_rate: Decimal,
        delivery_fee: Decimal,
        currency: String,
        default_page_size: u64,
        max_page_size: u64,
    ) -> Self {
        Self {
            db,
            event_sender,
            tax_rate,
            delivery_fee,
            currency,
            default_page_size,
            max_page_size,
        }
    }

    /// Converts a non-empty active cart into a persisted order.
    ///
    /// Items are deep-copied into immutable snapshots, totals recomputed
    /// from those snapshots, and the cart cleared, all in one transaction.
    /// The initial fulfillment status follows the payment method.
    #[instrument(skip(self, input), fields(cart_id = %input.cart_id))]
    pub async fn create_from_cart(
        &self,
        input: &CheckoutInput,
    ) -> Result<(order::Model, Vec<order_item::Model>), ServiceError> {
        input.validate()?;

        if input.order_type == OrderType::Delivery
            && input
                .delivery_address
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .is_empty()
        {
            return Err(ServiceError::ValidationError(
                "Delivery orders require a delivery address".into(),
            ));
        }

        let cart = Carts::find_by_id(input.cart_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart {} not found", input.cart_id)))?;
        if cart.status != CartStatus::Active {
            return Err(ServiceError::InvalidOperation(format!(
                "Cart {} has already been checked out",
                cart.id
            )));
        }

        let cart_items = CartItems::find()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .order_by_asc(cart_item::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        if cart_items.is_empty() {
            return Err(ServiceError::ValidationError(
                "Cannot check out an empty cart".into(),
            ));
        }

        // Recompute every line from its snapshotted selections.
        let line_totals: Vec<Decimal> = cart_items
            .iter()
            .map(|item| {
                pricing::line_item_total(
                    item.unit_price,
                    item.quantity,
                    &item.selected_modifiers,
                    &item.selected_upsells,
                )
            })
            .collect();
        let totals =
            pricing::order_totals(&line_totals, input.order_type, self.tax_rate, self.delivery_fee);

        let initial_status = match input.payment_method {
            PaymentMethod::Card => OrderStatus::AwaitingPayment,
            method if method.is_manual() => OrderStatus::PendingPayment,
            // Cash settles at handover; fulfillment may start immediately.
            _ => OrderStatus::PaymentConfirmed,
        };

        let order_id = Uuid::new_v4();
        let now = Utc::now();

        let txn = self.db.begin().await?;

        let order = order::ActiveModel {
            id: Set(order_id),
            order_number: Set(generate_order_number()),
            customer_name: Set(input.customer_name.trim().to_string()),
            customer_email: Set(input.customer_email.trim().to_string()),
            customer_phone: Set(input.customer_phone.trim().to_string()),
            order_type: Set(input.order_type),
            delivery_address: Set(input.delivery_address.clone()),
            payment_method: Set(input.payment_method),
            payment_status: Set(PaymentStatus::Unpaid),
            status: Set(initial_status),
            subtotal: Set(totals.subtotal),
            tax_amount: Set(totals.tax_amount),
            delivery_fee: Set(totals.delivery_fee),
            total_amount: Set(totals.total_amount),
            currency: Set(self.currency.clone()),
            external_payment_ref: Set(None),
            notes: Set(input.notes.clone()),
            created_at: Set(now),
            updated_at: Set(None),
        }
        .insert(&txn)
        .await?;

        let mut order_items = Vec::with_capacity(cart_items.len());
        for (item, line_total) in cart_items.iter().zip(line_totals.iter()) {
            let snapshot = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                menu_item_id: Set(item.menu_item_id),
                name: Set(item.name.clone()),
                unit_price: Set(item.unit_price),
                quantity: Set(item.quantity),
                selected_modifiers: Set(item.selected_modifiers.clone()),
                selected_upsells: Set(item.selected_upsells.clone()),
                special_requests: Set(item.special_requests.clone()),
                total_price: Set(*line_total),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;
            order_items.push(snapshot);
        }

        // Clear and retire the cart in the same transaction.
        CartItems::delete_many()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .exec(&txn)
            .await?;
        let mut converted: cart::ActiveModel = cart.into();
        converted.status = Set(CartStatus::Converted);
        converted.subtotal = Set(Decimal::ZERO);
        converted.tax_amount = Set(Decimal::ZERO);
        converted.total_amount = Set(Decimal::ZERO);
        converted.updated_at = Set(Some(now));
        converted.update(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::OrderPlaced(order_id))
            .await;
        info!(order_id = %order_id, order_number = %order.order_number, "Order created");
        Ok((order, order_items))
    }

    /// Looks up an order by UUID or by its human-readable order number.
    pub async fn get_order(
        &self,
        id_or_number: &str,
    ) -> Result<(order::Model, Vec<order_item::Model>), ServiceError> {
        let order = match Uuid::parse_str(id_or_number) {
            Ok(id) => Orders::find_by_id(id).one(&*self.db).await?,
            Err(_) => {
                Orders::find()
                    .filter(order::Column::OrderNumber.eq(id_or_number))
                    .one(&*self.db)
                    .await?
            }
        }
        .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id_or_number)))?;

        let items = self.order_items(order.id).await?;
        Ok((order, items))
    }

    pub async fn get_order_by_id(&self, order_id: Uuid) -> Result<order::Model, ServiceError> {
        Orders::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))
    }

    pub async fn order_items(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<order_item::Model>, ServiceError> {
        Ok(OrderItems::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .order_by_asc(order_item::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    /// Admin listing, newest first, with optional status filter.
    pub async fn list_orders(
        &self,
        query: &OrderListQuery,
    ) -> Result<(Vec<order::Model>, u64, u64, u64), ServiceError> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query
            .per_page
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size);

        let mut select = Orders::find().order_by_desc(order::Column::CreatedAt);
        if let Some(status) = query.status {
            select = select.filter(order::Column::Status.eq(status));
        }

        let paginator = select.paginate(&*self.db, per_page);
        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page - 1).await?;
        Ok((orders, page, per_page, total))
    }

    /// Applies a fulfillment transition, enforcing the transition table.
    ///
    /// A same-state update is a silent no-op. Cash orders settle their
    /// payment when they reach `delivered`, in the same transaction.
    #[instrument(skip(self), fields(order_id = %order_id, new_status = %new_status))]
    pub async fn update_status(
        &self,
        order_id: Uuid,
        new_status: OrderStatus,
    ) -> Result<order::Model, ServiceError> {
        let existing = self.get_order_by_id(order_id).await?;
        let old_status = existing.status;
        validate_transition(old_status, new_status, existing.order_type)?;

        if old_status == new_status {
            return Ok(existing);
        }

        let settles_cash = new_status == OrderStatus::Delivered
            && existing.payment_method == PaymentMethod::Cash
            && existing.payment_status != PaymentStatus::Confirmed;

        let txn = self.db.begin().await?;
        let mut active: order::ActiveModel = existing.into();
        active.status = Set(new_status);
        if settles_cash {
            active.payment_status = Set(PaymentStatus::Confirmed);
        }
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&txn).await?;
        txn.commit().await?;

        let event = if new_status == OrderStatus::Cancelled {
            Event::OrderCancelled(order_id)
        } else {
            Event::OrderStatusChanged {
                order_id,
                old_status: old_status.to_string(),
                new_status: new_status.to_string(),
            }
        };
        self.event_sender.send_or_log(event).await;

        info!(
            order_id = %order_id,
            old_status = %old_status,
            new_status = %new_status,
            "Order status updated"
        );
        Ok(updated)
    }

    /// Cancels an order from any non-terminal state.
    pub async fn cancel_order(&self, order_id: Uuid) -> Result<order::Model, ServiceError> {
        self.update_status(order_id, OrderStatus::Cancelled).await
    }
}

/// Order numbers pair a date component with a random suffix so they stay
/// human-readable while remaining collision-resistant.
fn generate_order_number() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(|c| (c as char).to_ascii_uppercase())
        .collect();
    format!("ORD-{}-{}", Utc::now().format("%Y%m%d"), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DatabaseConnection;
    use tokio::sync::mpsc;

    fn service() -> OrderService {
        let (tx, _rx) = mpsc::channel(8);
        OrderService::new(
            Arc::new(DatabaseConnection::Disconnected),
            Arc::new(EventSender::new(tx)),
            rust_decimal_macros::dec!(0.08),
            rust_decimal_macros::dec!(5.00),
            "USD".into(),
            20,
            100,
        )
    }

    fn checkout_input() -> CheckoutInput {
        CheckoutInput {
            cart_id: Uuid::new_v4(),
            customer_name: "Ada Lovelace".into(),
            customer_email: "ada@example.com".into(),
            customer_phone: "555-0100".into(),
            order_type: OrderType::Pickup,
            payment_method: PaymentMethod::Cash,
            delivery_address: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn checkout_rejects_invalid_email_before_touching_db() {
        let svc = service();
        let mut input = checkout_input();
        input.customer_email = "not-an-email".into();
        let err = svc.create_from_cart(&input).await.unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }

    #[tokio::test]
    async fn delivery_without_address_is_rejected() {
        let svc = service();
        let mut input = checkout_input();
        input.order_type = OrderType::Delivery;
        input.delivery_address = Some("   ".into());
        let err = svc.create_from_cart(&input).await.unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }

    #[test]
    fn order_numbers_have_date_and_random_suffix() {
        let a = generate_order_number();
        let b = generate_order_number();
        assert!(a.starts_with("ORD-"));
        assert_eq!(a.len(), "ORD-20250309-ABC123".len());
        assert_ne!(a, b);
    }
}
