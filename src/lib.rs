//! Tableside API Library
//!
//! Restaurant ordering backend: menu, carts, checkout with card / peer /
//! cash payment routing, payment-proof review, order lifecycle tracking,
//! and dining-event bookings.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::{extract::State, response::Json, routing::get, Router};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use utoipa::ToSchema;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<config::AppConfig>,
    pub event_sender: Arc<events::EventSender>,
    pub services: handlers::AppServices,
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            meta: Some(ResponseMeta::capture()),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// All /api/v1 routes.
pub fn api_v1_routes() -> Router<AppState> {
    let menu = Router::new()
        .route("/menu-items", get(handlers::menu::list_menu_items))
        .route("/menu-items/:id", get(handlers::menu::get_menu_item));

    let carts = Router::new()
        .route("/carts", axum::routing::post(handlers::carts::create_cart))
        .route(
            "/carts/:id",
            get(handlers::carts::get_cart).delete(handlers::carts::clear_cart),
        )
        .route(
            "/carts/:id/items",
            axum::routing::post(handlers::carts::add_item),
        )
        .route(
            "/carts/:id/items/:item_id",
            axum::routing::put(handlers::carts::update_item_quantity)
                .delete(handlers::carts::remove_item),
        );

    let checkout = Router::new().route(
        "/checkout",
        axum::routing::post(handlers::checkout::checkout),
    );

    let orders = Router::new()
        .route("/orders", get(handlers::orders::list_orders))
        .route("/orders/:id", get(handlers::orders::get_order))
        .route(
            "/orders/:id/status",
            axum::routing::put(handlers::orders::update_order_status),
        )
        .route(
            "/orders/:id/cancel",
            axum::routing::post(handlers::orders::cancel_order),
        );

    let proofs = Router::new()
        .route(
            "/orders/:id/payment-proofs",
            axum::routing::post(handlers::proofs::submit_proof),
        )
        .route("/payment-proofs", get(handlers::proofs::list_proofs))
        .route(
            "/payment-proofs/:id/approve",
            axum::routing::post(handlers::proofs::approve_proof),
        )
        .route(
            "/payment-proofs/:id/reject",
            axum::routing::post(handlers::proofs::reject_proof),
        );

    // Signature-verified, so no gateway auth assumption applies here.
    let payment_webhook = Router::new().route(
        "/webhooks/payment",
        axum::routing::post(handlers::payment_webhooks::payment_webhook),
    );

    let bookings = Router::new()
        .route("/events", get(handlers::bookings::list_events))
        .route("/events/:id", get(handlers::bookings::get_event))
        .route(
            "/events/:id/bookings",
            axum::routing::post(handlers::bookings::create_booking),
        )
        .route("/bookings/:id", get(handlers::bookings::get_booking))
        .route(
            "/bookings/:id/confirm",
            axum::routing::post(handlers::bookings::confirm_booking),
        )
        .route(
            "/bookings/:id/cancel",
            axum::routing::post(handlers::bookings::cancel_booking),
        );

    Router::new()
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        .merge(menu)
        .merge(carts)
        .merge(checkout)
        .merge(orders)
        .merge(proofs)
        .merge(payment_webhook)
        .merge(bookings)
}

/// Builds the full application router with middleware; shared between the
/// binary and the integration test harness.
pub fn build_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let max_body_size = state.config.max_body_size;

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_v1_routes())
        .merge(openapi::swagger_ui())
        .layer(axum::middleware::from_fn(
            crate::tracing::request_id_middleware,
        ))
        .layer(crate::tracing::configure_http_tracing())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(cors)
        .layer(DefaultBodyLimit::max(max_body_size))
        .with_state(state)
}

fn cors_layer(config: &config::AppConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    if config.should_allow_permissive_cors() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

async fn api_status() -> ApiResult<Value> {
    let status_data = json!({
        "status": "ok",
        "service": "tableside-api",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
    });
    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(State(state): State<AppState>) -> ApiResult<Value> {
    let database = match db::check_connection(&state.db).await {
        Ok(()) => "up",
        Err(_) => "down",
    };
    Ok(Json(ApiResponse::success(json!({
        "status": if database == "up" { "healthy" } else { "degraded" },
        "database": database,
        "timestamp": Utc::now().to_rfc3339(),
    }))))
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use chrono::DateTime;

    #[tokio::test]
    async fn success_response_includes_request_metadata() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-123"), async {
                ApiResponse::success("ok")
            })
            .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-123"));
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }

    #[tokio::test]
    async fn error_response_includes_request_metadata() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-err"), async {
                ApiResponse::<()>::error("oops".into())
            })
            .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-err"));
        assert!(!meta.timestamp.is_empty());
    }
}
