pub mod bookings;
pub mod carts;
pub mod checkout;
pub mod common;
pub mod menu;
pub mod orders;
pub mod payment_webhooks;
pub mod proofs;

use std::sync::Arc;

use crate::services::bookings::BookingService;
use crate::services::carts::CartService;
use crate::services::menu::MenuService;
use crate::services::orders::OrderService;
use crate::services::payments::PaymentService;
use crate::services::proofs::ProofService;

/// Service bundle shared through AppState.
#[derive(Clone)]
pub struct AppServices {
    pub menu: Arc<MenuService>,
    pub carts: Arc<CartService>,
    pub orders: Arc<OrderService>,
    pub payments: Arc<PaymentService>,
    pub proofs: Arc<ProofService>,
    pub bookings: Arc<BookingService>,
}
