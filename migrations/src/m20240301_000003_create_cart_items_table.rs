use sea_orm_migration::prelude::*;

use super::m20240301_000001_create_menu_items_table::MenuItems;
use super::m20240301_000002_create_carts_table::Carts;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CartItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CartItems::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CartItems::CartId).uuid().not_null())
                    .col(ColumnDef::new(CartItems::MenuItemId).uuid().not_null())
                    .col(ColumnDef::new(CartItems::Name).string().not_null())
                    .col(ColumnDef::new(CartItems::UnitPrice).decimal().not_null())
                    .col(ColumnDef::new(CartItems::Quantity).integer().not_null())
                    // Selections are frozen at add time so later menu edits
                    // cannot change what the customer agreed to pay.
                    .col(
                        ColumnDef::new(CartItems::SelectedModifiers)
                            .json()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CartItems::SelectedUpsells)
                            .json()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CartItems::SpecialRequests).text().null())
                    .col(ColumnDef::new(CartItems::TotalPrice).decimal().not_null())
                    .col(ColumnDef::new(CartItems::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(CartItems::UpdatedAt).timestamp().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cart_items_cart_id")
                            .from(CartItems::Table, CartItems::CartId)
                            .to(Carts::Table, Carts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cart_items_menu_item_id")
                            .from(CartItems::Table, CartItems::MenuItemId)
                            .to(MenuItems::Table, MenuItems::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CartItems::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum CartItems {
    Table,
    Id,
    CartId,
    MenuItemId,
    Name,
    UnitPrice,
    Quantity,
    SelectedModifiers,
    SelectedUpsells,
    SpecialRequests,
    TotalPrice,
    CreatedAt,
    UpdatedAt,
}
