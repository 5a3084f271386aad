use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Menu item entity
///
/// Modifier-group and upsell configuration live on the item as JSON
/// documents so menu edits never require a schema change.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "menu_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(nullable)]
    pub description: Option<String>,
    #[sea_orm(nullable)]
    pub category: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub base_price: Decimal,
    #[sea_orm(column_type = "Json")]
    pub modifier_groups: ModifierGroupsConfig,
    #[sea_orm(column_type = "Json")]
    pub upsell_offers: UpsellOffersConfig,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    #[sea_orm(nullable)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::cart_item::Entity")]
    CartItems,
}

impl Related<super::cart_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CartItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Modifier group configuration attached to a menu item
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult, ToSchema)]
#[serde(transparent)]
pub struct ModifierGroupsConfig(pub Vec<ModifierGroup>);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ModifierGroup {
    pub id: String,
    pub name: String,
    /// Whether the customer must pick at least one option from this group
    #[serde(default)]
    pub required: bool,
    /// Maximum selections allowed; `None` means unlimited
    #[serde(default)]
    pub max_selections: Option<u32>,
    pub options: Vec<ModifierOption>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ModifierOption {
    pub id: String,
    pub name: String,
    /// Signed per-unit price adjustment (discount options are negative)
    pub price_adjustment: Decimal,
}

/// Upsell offer configuration attached to a menu item
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult, ToSchema)]
#[serde(transparent)]
pub struct UpsellOffersConfig(pub Vec<UpsellOffer>);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UpsellOffer {
    pub id: String,
    pub name: String,
    pub price: Decimal,
}

/// Modifier selections frozen onto a cart or order line
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult, ToSchema)]
#[serde(transparent)]
pub struct ModifierSelections(pub Vec<SelectedModifier>);

/// A resolved modifier choice with its price captured at selection time
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SelectedModifier {
    pub group_id: String,
    pub option_id: String,
    pub name: String,
    pub price_adjustment: Decimal,
    /// How many times this option is applied per unit of the line item
    pub quantity: i32,
}

/// Upsell selections frozen onto a cart or order line
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult, ToSchema)]
#[serde(transparent)]
pub struct UpsellSelections(pub Vec<SelectedUpsell>);

/// A resolved upsell choice; the quantity is independent of the line quantity
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SelectedUpsell {
    pub offer_id: String,
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
}
