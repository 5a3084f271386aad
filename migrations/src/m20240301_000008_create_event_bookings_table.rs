use sea_orm_migration::prelude::*;

use super::m20240301_000007_create_dining_events_table::DiningEvents;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EventBookings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EventBookings::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(EventBookings::EventId).uuid().not_null())
                    .col(
                        ColumnDef::new(EventBookings::CustomerName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EventBookings::CustomerEmail)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(EventBookings::CustomerPhone).string().null())
                    .col(
                        ColumnDef::new(EventBookings::GuestCount)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EventBookings::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(EventBookings::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(EventBookings::UpdatedAt).timestamp().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_bookings_event_id")
                            .from(EventBookings::Table, EventBookings::EventId)
                            .to(DiningEvents::Table, DiningEvents::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EventBookings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum EventBookings {
    Table,
    Id,
    EventId,
    CustomerName,
    CustomerEmail,
    CustomerPhone,
    GuestCount,
    Status,
    CreatedAt,
    UpdatedAt,
}
