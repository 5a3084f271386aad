use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MenuItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MenuItems::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MenuItems::Name).string().not_null())
                    .col(ColumnDef::new(MenuItems::Description).text().null())
                    .col(ColumnDef::new(MenuItems::Category).string().null())
                    .col(ColumnDef::new(MenuItems::BasePrice).decimal().not_null())
                    // Modifier-group and upsell configuration are JSON documents;
                    // the shape is owned by entities::menu_item.
                    .col(
                        ColumnDef::new(MenuItems::ModifierGroups)
                            .json()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MenuItems::UpsellOffers).json().not_null())
                    .col(
                        ColumnDef::new(MenuItems::IsAvailable)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(MenuItems::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(MenuItems::UpdatedAt).timestamp().null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MenuItems::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum MenuItems {
    Table,
    Id,
    Name,
    Description,
    Category,
    BasePrice,
    ModifierGroups,
    UpsellOffers,
    IsAvailable,
    CreatedAt,
    UpdatedAt,
}
