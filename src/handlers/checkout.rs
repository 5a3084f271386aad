use axum::{extract::State, response::IntoResponse, Json};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::order::{OrderStatus, PaymentMethod, PaymentStatus};
use crate::errors::ServiceError;
use crate::handlers::common::created_response;
use crate::services::orders::CheckoutInput;
use crate::AppState;

/// Checkout result: the new order plus, for card payments, the hosted
/// payment page the customer must be redirected to.
#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub order_id: Uuid,
    pub order_number: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub total_amount: Decimal,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/v1/checkout",
    request_body = CheckoutInput,
    responses(
        (status = 201, description = "Order created", body = CheckoutResponse),
        (status = 400, description = "Invalid checkout request", body = crate::errors::ErrorResponse),
        (status = 402, description = "Card session could not be created", body = crate::errors::ErrorResponse)
    ),
    tag = "Checkout"
)]
pub async fn checkout(
    State(state): State<AppState>,
    Json(input): Json<CheckoutInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let (order, items) = state.services.orders.create_from_cart(&input).await?;

    let response = CheckoutResponse {
        order_id: order.id,
        order_number: order.order_number.clone(),
        status: order.status,
        payment_status: order.payment_status,
        total_amount: order.total_amount,
        currency: order.currency.clone(),
        redirect_url: None,
    };

    let redirect_url = if order.payment_method == PaymentMethod::Card {
        Some(
            state
                .services
                .payments
                .start_card_payment(order, &items)
                .await?,
        )
    } else {
        None
    };

    Ok(created_response(CheckoutResponse {
        redirect_url,
        ..response
    }))
}
