pub mod bookings;
pub mod carts;
pub mod hosted_checkout;
pub mod mail;
pub mod menu;
pub mod notifications;
pub mod order_status;
pub mod orders;
pub mod payments;
pub mod pricing;
pub mod proofs;
pub mod storage;
