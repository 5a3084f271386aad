use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use bytes::Bytes;
use tracing::warn;

use crate::errors::ServiceError;
use crate::services::payments::{verify_webhook_signature, WebhookEvent};
use crate::AppState;

// POST /api/v1/webhooks/payment
#[utoipa::path(
    post,
    path = "/api/v1/webhooks/payment",
    request_body = String,
    responses(
        (status = 200, description = "Webhook accepted"),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 401, description = "Invalid signature", body = crate::errors::ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ServiceError> {
    // Signature verification is a hard gate: without a configured secret
    // no webhook is trusted.
    let Some(secret) = state.config.payment_webhook_secret.as_deref() else {
        warn!("Payment webhook received but no webhook secret is configured");
        return Err(ServiceError::Unauthorized(
            "webhook verification unavailable".into(),
        ));
    };

    let timestamp = header_str(&headers, "x-timestamp")?;
    let signature = header_str(&headers, "x-signature")?;
    verify_webhook_signature(
        secret,
        timestamp,
        &body,
        signature,
        state.config.webhook_tolerance_secs() as i64,
    )?;

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| ServiceError::BadRequest(format!("invalid webhook payload: {}", e)))?;

    state.services.payments.handle_webhook_event(&event).await?;
    Ok((StatusCode::OK, "ok"))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, ServiceError> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ServiceError::Unauthorized(format!("missing {} header", name)))
}
