use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{cart, cart_item};
use crate::errors::ServiceError;
use crate::handlers::common::{created_response, no_content_response, success_response};
use crate::services::carts::AddItemInput;
use crate::AppState;

/// Cart with its line items, as returned to clients.
#[derive(Debug, Serialize)]
pub struct CartView {
    #[serde(flatten)]
    pub cart: cart::Model,
    pub items: Vec<cart_item::Model>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateQuantityRequest {
    pub quantity: i32,
}

#[utoipa::path(
    post,
    path = "/api/v1/carts",
    responses((status = 201, description = "Cart created")),
    tag = "Carts"
)]
pub async fn create_cart(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let cart = state.services.carts.create_cart().await?;
    Ok(created_response(cart))
}

#[utoipa::path(
    get,
    path = "/api/v1/carts/{id}",
    params(("id" = Uuid, Path, description = "Cart id")),
    responses(
        (status = 200, description = "Cart with items"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Carts"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let (cart, items) = state.services.carts.get_cart(id).await?;
    Ok(success_response(CartView { cart, items }))
}

#[utoipa::path(
    post,
    path = "/api/v1/carts/{id}/items",
    params(("id" = Uuid, Path, description = "Cart id")),
    request_body = AddItemInput,
    responses(
        (status = 201, description = "Item added"),
        (status = 400, description = "Invalid selections", body = crate::errors::ErrorResponse),
        (status = 404, description = "Cart or menu item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Carts"
)]
pub async fn add_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<AddItemInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = state.services.carts.add_item(id, input).await?;
    Ok(created_response(item))
}

#[utoipa::path(
    put,
    path = "/api/v1/carts/{id}/items/{item_id}",
    params(
        ("id" = Uuid, Path, description = "Cart id"),
        ("item_id" = Uuid, Path, description = "Cart item id")
    ),
    request_body = UpdateQuantityRequest,
    responses(
        (status = 200, description = "Quantity updated; a quantity below 1 removes the line"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Carts"
)]
pub async fn update_item_quantity(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UpdateQuantityRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .services
        .carts
        .update_quantity(id, item_id, request.quantity)
        .await?;
    let (cart, items) = state.services.carts.get_cart(id).await?;
    Ok(success_response(CartView { cart, items }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/carts/{id}/items/{item_id}",
    params(
        ("id" = Uuid, Path, description = "Cart id"),
        ("item_id" = Uuid, Path, description = "Cart item id")
    ),
    responses(
        (status = 204, description = "Item removed"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Carts"
)]
pub async fn remove_item(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.carts.remove_item(id, item_id).await?;
    Ok(no_content_response())
}

#[utoipa::path(
    delete,
    path = "/api/v1/carts/{id}",
    params(("id" = Uuid, Path, description = "Cart id")),
    responses(
        (status = 204, description = "Cart cleared"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Carts"
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.carts.clear_cart(id).await?;
    Ok(no_content_response())
}
