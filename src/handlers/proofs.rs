use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::payment_proof::ProofStatus;
use crate::errors::ServiceError;
use crate::handlers::common::{created_response, success_response};
use crate::AppState;

const ACCEPTED_CONTENT_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/webp",
    "application/pdf",
];

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SubmitProofQuery {
    pub comments: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProofListQuery {
    pub status: Option<ProofStatus>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RejectProofRequest {
    pub comments: Option<String>,
}

// POST /api/v1/orders/{id}/payment-proofs
//
// The artifact is the raw request body; its content type comes from the
// Content-Type header and reviewer-visible comments from the query string.
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/payment-proofs",
    params(
        ("id" = Uuid, Path, description = "Order id"),
        ("comments" = Option<String>, Query, description = "Customer comments for the reviewer")
    ),
    request_body(content = Vec<u8>, description = "Proof image or PDF bytes"),
    responses(
        (status = 201, description = "Proof submitted"),
        (status = 400, description = "Unsupported file or wrong order state", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 502, description = "Storage unavailable", body = crate::errors::ErrorResponse)
    ),
    tag = "Payment proofs"
)]
pub async fn submit_proof(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<SubmitProofQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ServiceError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.split(';').next().unwrap_or(value).trim().to_string())
        .ok_or_else(|| {
            ServiceError::ValidationError("Content-Type header is required".into())
        })?;
    if !ACCEPTED_CONTENT_TYPES.contains(&content_type.as_str()) {
        return Err(ServiceError::ValidationError(format!(
            "Unsupported proof content type '{}'; expected an image or PDF",
            content_type
        )));
    }

    let proof = state
        .services
        .proofs
        .submit_proof(id, body, &content_type, query.comments)
        .await?;
    Ok(created_response(proof))
}

#[utoipa::path(
    get,
    path = "/api/v1/payment-proofs",
    params(("status" = Option<String>, Query, description = "Filter by proof status")),
    responses((status = 200, description = "Proofs, oldest first")),
    tag = "Payment proofs"
)]
pub async fn list_proofs(
    State(state): State<AppState>,
    Query(query): Query<ProofListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let proofs = state.services.proofs.list_proofs(query.status).await?;
    Ok(success_response(proofs))
}

#[utoipa::path(
    post,
    path = "/api/v1/payment-proofs/{id}/approve",
    params(("id" = Uuid, Path, description = "Proof id")),
    responses(
        (status = 200, description = "Proof approved, payment confirmed"),
        (status = 400, description = "Proof already reviewed", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Payment proofs"
)]
pub async fn approve_proof(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let proof = state.services.proofs.approve_proof(id).await?;
    Ok(success_response(proof))
}

#[utoipa::path(
    post,
    path = "/api/v1/payment-proofs/{id}/reject",
    params(("id" = Uuid, Path, description = "Proof id")),
    request_body = RejectProofRequest,
    responses(
        (status = 200, description = "Proof rejected, order back to unpaid"),
        (status = 400, description = "Proof already reviewed", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Payment proofs"
)]
pub async fn reject_proof(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<RejectProofRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let proof = state
        .services
        .proofs
        .reject_proof(id, request.comments)
        .await?;
    Ok(success_response(proof))
}
