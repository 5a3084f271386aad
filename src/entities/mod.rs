pub mod cart;
pub mod cart_item;
pub mod dining_event;
pub mod event_booking;
pub mod menu_item;
pub mod order;
pub mod order_item;
pub mod payment_proof;
