pub use sea_orm_migration::prelude::*;

mod m20240301_000001_create_menu_items_table;
mod m20240301_000002_create_carts_table;
mod m20240301_000003_create_cart_items_table;
mod m20240301_000004_create_orders_table;
mod m20240301_000005_create_order_items_table;
mod m20240301_000006_create_payment_proofs_table;
mod m20240301_000007_create_dining_events_table;
mod m20240301_000008_create_event_bookings_table;
mod m20240415_000009_add_lookup_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_menu_items_table::Migration),
            Box::new(m20240301_000002_create_carts_table::Migration),
            Box::new(m20240301_000003_create_cart_items_table::Migration),
            Box::new(m20240301_000004_create_orders_table::Migration),
            Box::new(m20240301_000005_create_order_items_table::Migration),
            Box::new(m20240301_000006_create_payment_proofs_table::Migration),
            Box::new(m20240301_000007_create_dining_events_table::Migration),
            Box::new(m20240301_000008_create_event_bookings_table::Migration),
            Box::new(m20240415_000009_add_lookup_indexes::Migration),
        ]
    }
}
