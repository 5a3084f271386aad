//! Pure pricing computations for cart and order lines.
//!
//! Nothing in this module touches the database. Callers resolve prices
//! from the menu item record and pass selections in; client-supplied
//! prices are never trusted.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::menu_item::{
    self, ModifierSelections, SelectedModifier, SelectedUpsell, UpsellSelections,
};
use crate::entities::order::OrderType;
use crate::errors::ServiceError;

/// Requested modifier choice, as sent by the client
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ModifierSelectionInput {
    pub group_id: String,
    pub option_id: String,
    /// Applications of the option per unit of the line item
    pub quantity: i32,
}

/// Requested upsell, as sent by the client
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct UpsellSelectionInput {
    pub upsell_id: String,
    pub quantity: i32,
}

/// Cart- or order-level totals
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub delivery_fee: Decimal,
    pub total_amount: Decimal,
}

/// Per-unit price adjustment from modifier selections. Negative
/// adjustments (discount options) are allowed.
pub fn per_unit_adjustment(modifiers: &ModifierSelections) -> Decimal {
    modifiers
        .0
        .iter()
        .map(|m| m.price_adjustment * Decimal::from(m.quantity))
        .sum()
}

/// Total for the upsells on a line, independent of the line quantity.
pub fn upsell_total(upsells: &UpsellSelections) -> Decimal {
    upsells
        .0
        .iter()
        .map(|u| u.price * Decimal::from(u.quantity))
        .sum()
}

/// Line total: modifier-adjusted item price times quantity, plus upsells.
pub fn line_item_total(
    unit_price: Decimal,
    quantity: i32,
    modifiers: &ModifierSelections,
    upsells: &UpsellSelections,
) -> Decimal {
    (unit_price + per_unit_adjustment(modifiers)) * Decimal::from(quantity) + upsell_total(upsells)
}

/// Rescales a cached line total to a new quantity.
///
/// Only the item portion scales; the upsell portion is independent of the
/// line quantity. The result is exactly what `line_item_total` would
/// recompute from the stored selections (property-tested below).
pub fn rescale_line_total(
    old_total: Decimal,
    upsells: &UpsellSelections,
    old_quantity: i32,
    new_quantity: i32,
) -> Decimal {
    let upsell_part = upsell_total(upsells);
    let item_part = old_total - upsell_part;
    item_part / Decimal::from(old_quantity) * Decimal::from(new_quantity) + upsell_part
}

/// Resolves requested selections against the menu item configuration,
/// freezing names and prices from the datastore record.
///
/// Rejects (never clamps): unknown groups, options, or upsells; a required
/// group with nothing selected; a group whose total selected quantity
/// exceeds its `max_selections`.
pub fn resolve_selections(
    item: &menu_item::Model,
    modifiers: &[ModifierSelectionInput],
    upsells: &[UpsellSelectionInput],
) -> Result<(ModifierSelections, UpsellSelections), ServiceError> {
    let mut selected_modifiers = Vec::new();

    for input in modifiers {
        if input.quantity < 0 {
            return Err(ServiceError::ValidationError(format!(
                "Modifier quantity for option '{}' cannot be negative",
                input.option_id
            )));
        }
        if input.quantity == 0 {
            continue;
        }

        let group = item
            .modifier_groups
            .0
            .iter()
            .find(|g| g.id == input.group_id)
            .ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "Unknown modifier group '{}' for item '{}'",
                    input.group_id, item.name
                ))
            })?;
        let option = group
            .options
            .iter()
            .find(|o| o.id == input.option_id)
            .ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "Unknown option '{}' in modifier group '{}'",
                    input.option_id, group.name
                ))
            })?;

        selected_modifiers.push(SelectedModifier {
            group_id: group.id.clone(),
            option_id: option.id.clone(),
            name: option.name.clone(),
            price_adjustment: option.price_adjustment,
            quantity: input.quantity,
        });
    }

    for group in &item.modifier_groups.0 {
        let total_selected: i64 = selected_modifiers
            .iter()
            .filter(|m| m.group_id == group.id)
            .map(|m| m.quantity as i64)
            .sum();

        if group.required && total_selected == 0 {
            return Err(ServiceError::ValidationError(format!(
                "Modifier group '{}' requires a selection",
                group.name
            )));
        }
        if let Some(max) = group.max_selections {
            if total_selected > max as i64 {
                return Err(ServiceError::ValidationError(format!(
                    "Modifier group '{}' allows at most {} selections",
                    group.name, max
                )));
            }
        }
    }

    let mut selected_upsells = Vec::new();
    for input in upsells {
        if input.quantity < 1 {
            return Err(ServiceError::ValidationError(format!(
                "Upsell quantity for '{}' must be at least 1",
                input.upsell_id
            )));
        }
        let offer = item
            .upsell_offers
            .0
            .iter()
            .find(|u| u.id == input.upsell_id)
            .ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "Unknown upsell '{}' for item '{}'",
                    input.upsell_id, item.name
                ))
            })?;
        selected_upsells.push(SelectedUpsell {
            offer_id: offer.id.clone(),
            name: offer.name.clone(),
            price: offer.price,
            quantity: input.quantity,
        });
    }

    Ok((
        ModifierSelections(selected_modifiers),
        UpsellSelections(selected_upsells),
    ))
}

/// Converts a configured f64 rate (e.g. 0.08) into a Decimal.
pub fn rate_from_config(rate: f64) -> Decimal {
    Decimal::from_f64_retain(rate).unwrap_or_default()
}

/// Cart/order totals from line totals. Tax is rounded to cents; the
/// delivery fee applies only to delivery orders.
pub fn order_totals(
    line_totals: &[Decimal],
    order_type: OrderType,
    tax_rate: Decimal,
    delivery_fee: Decimal,
) -> OrderTotals {
    let subtotal: Decimal = line_totals.iter().copied().sum();
    let tax_amount =
        (subtotal * tax_rate).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let delivery_fee = match order_type {
        OrderType::Delivery => {
            delivery_fee.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        }
        OrderType::Pickup => Decimal::ZERO,
    };
    let total_amount = subtotal + tax_amount + delivery_fee;

    OrderTotals {
        subtotal,
        tax_amount,
        delivery_fee,
        total_amount,
    }
}
