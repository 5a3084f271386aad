use sea_orm_migration::prelude::*;

use super::m20240301_000003_create_cart_items_table::CartItems;
use super::m20240301_000004_create_orders_table::Orders;
use super::m20240301_000005_create_order_items_table::OrderItems;
use super::m20240301_000006_create_payment_proofs_table::PaymentProofs;
use super::m20240301_000008_create_event_bookings_table::EventBookings;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_orders_external_payment_ref")
                    .table(Orders::Table)
                    .col(Orders::ExternalPaymentRef)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_status")
                    .table(Orders::Table)
                    .col(Orders::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_cart_items_cart_id")
                    .table(CartItems::Table)
                    .col(CartItems::CartId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_order_items_order_id")
                    .table(OrderItems::Table)
                    .col(OrderItems::OrderId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_payment_proofs_order_id")
                    .table(PaymentProofs::Table)
                    .col(PaymentProofs::OrderId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_payment_proofs_status")
                    .table(PaymentProofs::Table)
                    .col(PaymentProofs::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_event_bookings_event_id")
                    .table(EventBookings::Table)
                    .col(EventBookings::EventId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_event_bookings_event_id")
                    .table(EventBookings::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_payment_proofs_status")
                    .table(PaymentProofs::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_payment_proofs_order_id")
                    .table(PaymentProofs::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_order_items_order_id")
                    .table(OrderItems::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_cart_items_cart_id")
                    .table(CartItems::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_orders_status")
                    .table(Orders::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_orders_external_payment_ref")
                    .table(Orders::Table)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}
