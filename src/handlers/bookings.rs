use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::handlers::common::{created_response, success_response};
use crate::services::bookings::CreateBookingInput;
use crate::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/events",
    responses((status = 200, description = "Dining events, soonest first")),
    tag = "Events"
)]
pub async fn list_events(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let events = state.services.bookings.list_events().await?;
    Ok(success_response(events))
}

#[utoipa::path(
    get,
    path = "/api/v1/events/{id}",
    params(("id" = Uuid, Path, description = "Dining event id")),
    responses(
        (status = 200, description = "Dining event"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Events"
)]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let event = state.services.bookings.get_event(id).await?;
    Ok(success_response(event))
}

#[utoipa::path(
    post,
    path = "/api/v1/events/{id}/bookings",
    params(("id" = Uuid, Path, description = "Dining event id")),
    request_body = CreateBookingInput,
    responses(
        (status = 201, description = "Booking created"),
        (status = 404, description = "Event not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Not enough spots left", body = crate::errors::ErrorResponse)
    ),
    tag = "Events"
)]
pub async fn create_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<CreateBookingInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let booking = state.services.bookings.create_booking(id, &input).await?;
    Ok(created_response(booking))
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings/{id}",
    params(("id" = Uuid, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Events"
)]
pub async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let booking = state.services.bookings.get_booking(id).await?;
    Ok(success_response(booking))
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/confirm",
    params(("id" = Uuid, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking confirmed"),
        (status = 400, description = "Booking not pending", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Events"
)]
pub async fn confirm_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let booking = state.services.bookings.confirm_booking(id).await?;
    Ok(success_response(booking))
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/cancel",
    params(("id" = Uuid, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking cancelled, spots restored"),
        (status = 400, description = "Booking already cancelled", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Events"
)]
pub async fn cancel_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let booking = state.services.bookings.cancel_booking(id).await?;
    Ok(success_response(booking))
}
