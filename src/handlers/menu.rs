use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::handlers::common::success_response;
use crate::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/menu-items",
    responses(
        (status = 200, description = "Available menu items")
    ),
    tag = "Menu"
)]
pub async fn list_menu_items(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let items = state.services.menu.list_available().await?;
    Ok(success_response(items))
}

#[utoipa::path(
    get,
    path = "/api/v1/menu-items/{id}",
    params(("id" = Uuid, Path, description = "Menu item id")),
    responses(
        (status = 200, description = "Menu item"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Menu"
)]
pub async fn get_menu_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = state.services.menu.get_item(id).await?;
    Ok(success_response(item))
}
