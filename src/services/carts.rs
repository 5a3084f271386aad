//! Cart store: server-persisted carts with priced line items.
//!
//! Prices are resolved from the menu item record on every add; the client
//! only ever sends ids and quantities. Every mutation recomputes the cart
//! totals and emits a change event carrying the new item count.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
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
use crate::entities::menu_item::{self, Entity as MenuItems};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::pricing::{self, ModifierSelectionInput, UpsellSelectionInput};

/// Request payload for adding an item to a cart
#[derive(Clone, Debug, Deserialize, Validate, ToSchema)]
pub struct AddItemInput {
    pub menu_item_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    #[serde(default)]
    pub modifiers: Vec<ModifierSelectionInput>,
    #[serde(default)]
    pub upsells: Vec<UpsellSelectionInput>,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub special_requests: Option<String>,
}

#[derive(Clone)]
pub struct CartService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    tax_rate: Decimal,
    currency: String,
}

impl CartService {
    pub fn new(
        db: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        tax_rate: Decimal,
        currency: String,
    ) -> Self {
        Self {
            db,
            event_sender,
            tax_rate,
            currency,
        }
    }

    /// Creates an empty active cart.
    #[instrument(skip(self))]
    pub async fn create_cart(&self) -> Result<cart::Model, ServiceError> {
        let now = Utc::now();
        let model = cart::ActiveModel {
            id: Set(Uuid::new_v4()),
            status: Set(CartStatus::Active),
            subtotal: Set(Decimal::ZERO),
            tax_amount: Set(Decimal::ZERO),
            total_amount: Set(Decimal::ZERO),
            currency: Set(self.currency.clone()),
            created_at: Set(now),
            updated_at: Set(None),
        };
        let saved = model.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CartCreated(saved.id))
            .await;
        info!(cart_id = %saved.id, "Cart created");
        Ok(saved)
    }

    /// Loads a cart with its items in insertion order.
    pub async fn get_cart(
        &self,
        cart_id: Uuid,
    ) -> Result<(cart::Model, Vec<cart_item::Model>), ServiceError> {
        let cart = self.load_cart(cart_id).await?;
        let items = CartItems::find()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .order_by_asc(cart_item::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok((cart, items))
    }

    /// Adds a priced line item to the cart.
    ///
    /// Identical items are never merged: the same menu item with different
    /// customizations (or even the same ones) stays a distinct entry.
    #[instrument(skip(self, input), fields(cart_id = %cart_id, menu_item_id = %input.menu_item_id))]
    pub async fn add_item(
        &self,
        cart_id: Uuid,
        input: AddItemInput,
    ) -> Result<cart_item::Model, ServiceError> {
        input.validate()?;

        let cart = self.load_active_cart(cart_id).await?;
        let menu_item = MenuItems::find_by_id(input.menu_item_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Menu item {} not found", input.menu_item_id))
            })?;
        if !menu_item.is_available {
            return Err(ServiceError::InvalidOperation(format!(
                "Menu item '{}' is not available",
                menu_item.name
            )));
        }

        let (modifiers, upsells) =
            pricing::resolve_selections(&menu_item, &input.modifiers, &input.upsells)?;
        let total_price =
            pricing::line_item_total(menu_item.base_price, input.quantity, &modifiers, &upsells);

        let txn = self.db.begin().await?;
        let now = Utc::now();
        let item = cart_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            cart_id: Set(cart.id),
            menu_item_id: Set(menu_item.id),
            name: Set(menu_item.name.clone()),
            unit_price: Set(menu_item.base_price),
            quantity: Set(input.quantity),
            selected_modifiers: Set(modifiers),
            selected_upsells: Set(upsells),
            special_requests: Set(input.special_requests.clone()),
            total_price: Set(total_price),
            created_at: Set(now),
            updated_at: Set(None),
        };
        let saved = item.insert(&txn).await?;
        let item_count = recalculate_cart_totals(&txn, cart.id, self.tax_rate).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartUpdated {
                cart_id: cart.id,
                item_count,
            })
            .await;
        Ok(saved)
    }

    /// Adjusts a line's quantity, rescaling its cached total. A quantity
    /// below 1 removes the line.
    #[instrument(skip(self), fields(cart_id = %cart_id, item_id = %item_id))]
    pub async fn update_quantity(
        &self,
        cart_id: Uuid,
        item_id: Uuid,
        new_quantity: i32,
    ) -> Result<(), ServiceError> {
        if new_quantity < 1 {
            return self.remove_item(cart_id, item_id).await;
        }

        let cart = self.load_active_cart(cart_id).await?;
        let item = self.load_cart_item(cart.id, item_id).await?;

        let new_total = pricing::rescale_line_total(
            item.total_price,
            &item.selected_upsells,
            item.quantity,
            new_quantity,
        );

        let txn = self.db.begin().await?;
        let mut active: cart_item::ActiveModel = item.into();
        active.quantity = Set(new_quantity);
        active.total_price = Set(new_total);
        active.updated_at = Set(Some(Utc::now()));
        active.update(&txn).await?;
        let item_count = recalculate_cart_totals(&txn, cart.id, self.tax_rate).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartUpdated {
                cart_id: cart.id,
                item_count,
            })
            .await;
        Ok(())
    }

    /// Removes a line item from the cart.
    #[instrument(skip(self), fields(cart_id = %cart_id, item_id = %item_id))]
    pub async fn remove_item(&self, cart_id: Uuid, item_id: Uuid) -> Result<(), ServiceError> {
        let cart = self.load_active_cart(cart_id).await?;
        let item = self.load_cart_item(cart.id, item_id).await?;

        let txn = self.db.begin().await?;
        CartItems::delete_by_id(item.id).exec(&txn).await?;
        let item_count = recalculate_cart_totals(&txn, cart.id, self.tax_rate).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartUpdated {
                cart_id: cart.id,
                item_count,
            })
            .await;
        Ok(())
    }

    /// Empties the cart and zeroes its totals.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn clear_cart(&self, cart_id: Uuid) -> Result<(), ServiceError> {
        let cart = self.load_active_cart(cart_id).await?;

        let txn = self.db.begin().await?;
        CartItems::delete_many()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .exec(&txn)
            .await?;
        recalculate_cart_totals(&txn, cart.id, self.tax_rate).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartCleared(cart.id))
            .await;
        Ok(())
    }

    async fn load_cart(&self, cart_id: Uuid) -> Result<cart::Model, ServiceError> {
        Carts::find_by_id(cart_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart {} not found", cart_id)))
    }

    async fn load_active_cart(&self, cart_id: Uuid) -> Result<cart::Model, ServiceError> {
        let cart = self.load_cart(cart_id).await?;
        if cart.status != CartStatus::Active {
            return Err(ServiceError::InvalidOperation(format!(
                "Cart {} is no longer active",
                cart_id
            )));
        }
        Ok(cart)
    }

    async fn load_cart_item(
        &self,
        cart_id: Uuid,
        item_id: Uuid,
    ) -> Result<cart_item::Model, ServiceError> {
        CartItems::find_by_id(item_id)
            .filter(cart_item::Column::CartId.eq(cart_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Cart item {} not found in cart {}", item_id, cart_id))
            })
    }
}

/// Recomputes and persists cart totals from the current line items.
/// Returns the item count for the change event. Runs on the caller's
/// connection so it can share the mutation's transaction.
pub async fn recalculate_cart_totals<C: ConnectionTrait>(
    db: &C,
    cart_id: Uuid,
    tax_rate: Decimal,
) -> Result<u64, ServiceError> {
    let items = CartItems::find()
        .filter(cart_item::Column::CartId.eq(cart_id))
        .all(db)
        .await?;
    let line_totals: Vec<Decimal> = items.iter().map(|item| item.total_price).collect();

    // Carts have no order type yet; the delivery fee is applied at checkout.
    let totals = pricing::order_totals(
        &line_totals,
        crate::entities::order::OrderType::Pickup,
        tax_rate,
        Decimal::ZERO,
    );

    let mut cart: cart::ActiveModel = Carts::find_by_id(cart_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Cart {} not found", cart_id)))?
        .into();
    cart.subtotal = Set(totals.subtotal);
    cart.tax_amount = Set(totals.tax_amount);
    cart.total_amount = Set(totals.total_amount);
    cart.updated_at = Set(Some(Utc::now()));
    cart.update(db).await?;

    let count = CartItems::find()
        .filter(cart_item::Column::CartId.eq(cart_id))
        .count(db)
        .await?;
    Ok(count)
}
