use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DiningEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DiningEvents::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DiningEvents::Name).string().not_null())
                    .col(ColumnDef::new(DiningEvents::Description).text().null())
                    .col(
                        ColumnDef::new(DiningEvents::StartsAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DiningEvents::Capacity).integer().not_null())
                    .col(
                        ColumnDef::new(DiningEvents::AvailableSpots)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DiningEvents::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DiningEvents::UpdatedAt).timestamp().null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DiningEvents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum DiningEvents {
    Table,
    Id,
    Name,
    Description,
    StartsAt,
    Capacity,
    AvailableSpots,
    CreatedAt,
    UpdatedAt,
}
