use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tableside API",
        version = "0.3.0",
        description = r#"
# Tableside Restaurant Ordering API

Menu browsing, server-side carts, checkout with card / peer-payment /
cash routing, payment-proof review, order lifecycle tracking, and
dining-event bookings.

## Payments

- **Card**: checkout returns a `redirect_url` to the hosted payment page;
  the order is confirmed by a signed processor webhook.
- **Venmo / Zelle**: the customer uploads a payment proof which staff
  approve or reject from the review queue.
- **Cash**: settled at handover; the order enters fulfillment immediately.

## Errors

Errors share a JSON envelope with `error`, `message`, `request_id`, and
`timestamp` fields. Admin routes are expected to sit behind an external
gateway; the webhook route is signature-verified instead.
        "#
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    paths(
        handlers::menu::list_menu_items,
        handlers::menu::get_menu_item,
        handlers::carts::create_cart,
        handlers::carts::get_cart,
        handlers::carts::add_item,
        handlers::carts::update_item_quantity,
        handlers::carts::remove_item,
        handlers::carts::clear_cart,
        handlers::checkout::checkout,
        handlers::orders::list_orders,
        handlers::orders::get_order,
        handlers::orders::update_order_status,
        handlers::orders::cancel_order,
        handlers::proofs::submit_proof,
        handlers::proofs::list_proofs,
        handlers::proofs::approve_proof,
        handlers::proofs::reject_proof,
        handlers::payment_webhooks::payment_webhook,
        handlers::bookings::list_events,
        handlers::bookings::get_event,
        handlers::bookings::create_booking,
        handlers::bookings::get_booking,
        handlers::bookings::confirm_booking,
        handlers::bookings::cancel_booking,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::services::carts::AddItemInput,
        crate::services::orders::CheckoutInput,
        crate::services::bookings::CreateBookingInput,
        crate::handlers::carts::UpdateQuantityRequest,
        crate::handlers::checkout::CheckoutResponse,
        crate::handlers::orders::UpdateStatusRequest,
        crate::handlers::proofs::RejectProofRequest,
        crate::entities::order::OrderType,
        crate::entities::order::PaymentMethod,
        crate::entities::order::PaymentStatus,
        crate::entities::order::OrderStatus,
        crate::entities::payment_proof::ProofStatus,
        crate::entities::event_booking::BookingStatus,
    )),
    tags(
        (name = "Menu", description = "Menu item reads"),
        (name = "Carts", description = "Server-side cart management"),
        (name = "Checkout", description = "Cart-to-order conversion and payment routing"),
        (name = "Orders", description = "Order tracking and admin lifecycle transitions"),
        (name = "Payment proofs", description = "Manual payment verification queue"),
        (name = "Payments", description = "Processor webhook"),
        (name = "Events", description = "Dining events and spot bookings"),
    )
)]
pub struct ApiDoc;

/// Swagger UI router serving the generated document.
pub fn swagger_ui() -> Router<AppState> {
    SwaggerUi::new("/docs")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}
