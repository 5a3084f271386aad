use sea_orm_migration::prelude::*;

use super::m20240301_000004_create_orders_table::Orders;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PaymentProofs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PaymentProofs::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PaymentProofs::OrderId).uuid().not_null())
                    .col(ColumnDef::new(PaymentProofs::FileUrl).string().not_null())
                    .col(ColumnDef::new(PaymentProofs::ContentType).string().null())
                    .col(ColumnDef::new(PaymentProofs::Comments).text().null())
                    .col(
                        ColumnDef::new(PaymentProofs::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(PaymentProofs::ReviewComments).text().null())
                    .col(
                        ColumnDef::new(PaymentProofs::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PaymentProofs::ReviewedAt).timestamp().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_proofs_order_id")
                            .from(PaymentProofs::Table, PaymentProofs::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PaymentProofs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum PaymentProofs {
    Table,
    Id,
    OrderId,
    FileUrl,
    ContentType,
    Comments,
    Status,
    ReviewComments,
    CreatedAt,
    ReviewedAt,
}
