use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use sha2::Sha256;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use tableside_api::config::AppConfig;
use tableside_api::entities::dining_event;
use tableside_api::entities::menu_item::{
    self, ModifierGroup, ModifierGroupsConfig, ModifierOption, UpsellOffer, UpsellOffersConfig,
};
use tableside_api::events::{self, EventSender};
use tableside_api::handlers::AppServices;
use tableside_api::services::hosted_checkout::HostedCheckoutClient;
use tableside_api::services::mail::RecordingMailSender;
use tableside_api::services::notifications::NotificationDispatcher;
use tableside_api::services::storage::{InMemoryObjectStorage, ObjectStorage};
use tableside_api::services::{bookings, carts, menu, orders, payments, pricing, proofs};
use tableside_api::{db, AppState};

pub const WEBHOOK_SECRET: &str = "whsec_test_secret";

/// Application harness backed by a fresh SQLite database per test.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub mailer: Arc<RecordingMailSender>,
    _event_task: tokio::task::JoinHandle<()>,
    _db_dir: tempfile::TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::build(None, Arc::new(InMemoryObjectStorage::new())).await
    }

    /// Points the hosted-checkout client at a mock processor.
    pub async fn with_checkout_url(base_url: &str) -> Self {
        Self::build(
            Some(base_url.to_string()),
            Arc::new(InMemoryObjectStorage::new()),
        )
        .await
    }

    /// Swaps in a custom storage backend (e.g. the failing double).
    pub async fn with_storage(storage: Arc<dyn ObjectStorage>) -> Self {
        Self::build(None, storage).await
    }

    async fn build(checkout_base_url: Option<String>, storage: Arc<dyn ObjectStorage>) -> Self {
        let db_dir = tempfile::tempdir().expect("create temp dir for test database");
        let db_path = db_dir.path().join("tableside_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.auto_migrate = true;
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.cors_allow_any_origin = true;
        cfg.payment_webhook_secret = Some(WEBHOOK_SECRET.to_string());
        if let Some(base_url) = checkout_base_url {
            cfg.checkout.base_url = base_url;
        }

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");
        let db = Arc::new(pool);

        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = Arc::new(EventSender::new(event_tx));

        let mailer = Arc::new(RecordingMailSender::new());
        let dispatcher = Arc::new(NotificationDispatcher::new(db.clone(), mailer.clone()));
        let event_task = tokio::spawn(events::process_events(event_rx, dispatcher));

        let checkout_client = Arc::new(HostedCheckoutClient::new(cfg.checkout.clone()));
        let tax_rate = pricing::rate_from_config(cfg.default_tax_rate);
        let delivery_fee = pricing::rate_from_config(cfg.delivery_fee);

        let services = AppServices {
            menu: Arc::new(menu::MenuService::new(db.clone())),
            carts: Arc::new(carts::CartService::new(
                db.clone(),
                event_sender.clone(),
                tax_rate,
                cfg.default_currency.clone(),
            )),
            orders: Arc::new(orders::OrderService::new(
                db.clone(),
                event_sender.clone(),
                tax_rate,
                delivery_fee,
                cfg.default_currency.clone(),
                cfg.api_default_page_size as u64,
                cfg.api_max_page_size as u64,
            )),
            payments: Arc::new(payments::PaymentService::new(
                db.clone(),
                event_sender.clone(),
                checkout_client,
            )),
            proofs: Arc::new(proofs::ProofService::new(
                db.clone(),
                event_sender.clone(),
                storage,
            )),
            bookings: Arc::new(bookings::BookingService::new(
                db.clone(),
                event_sender.clone(),
            )),
        };

        let state = AppState {
            db,
            config: Arc::new(cfg),
            event_sender,
            services,
        };
        let router = tableside_api::build_app(state.clone());

        Self {
            router,
            state,
            mailer,
            _event_task: event_task,
            _db_dir: db_dir,
        }
    }

    /// Sends a JSON (or empty) request through the router.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("serialize request body"))
        } else {
            Body::empty()
        };
        self.router
            .clone()
            .oneshot(builder.body(body).expect("build request"))
            .await
            .expect("router error during test request")
    }

    /// Sends a raw-body request with explicit headers.
    pub async fn request_raw(
        &self,
        method: Method,
        uri: &str,
        body: Vec<u8>,
        headers: &[(&str, &str)],
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        self.router
            .clone()
            .oneshot(builder.body(Body::from(body)).expect("build request"))
            .await
            .expect("router error during test request")
    }

    /// Inserts a menu item with the given customizations.
    pub async fn seed_menu_item(
        &self,
        name: &str,
        base_price: Decimal,
        groups: Vec<ModifierGroup>,
        upsells: Vec<UpsellOffer>,
    ) -> menu_item::Model {
        menu_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            description: Set(None),
            category: Set(None),
            base_price: Set(base_price),
            modifier_groups: Set(ModifierGroupsConfig(groups)),
            upsell_offers: Set(UpsellOffersConfig(upsells)),
            is_available: Set(true),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed menu item")
    }

    /// Inserts a dining event with the given capacity.
    pub async fn seed_dining_event(&self, name: &str, capacity: i32) -> dining_event::Model {
        dining_event::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            description: Set(Some("Seeded for tests".to_string())),
            starts_at: Set(Utc::now() + Duration::days(7)),
            capacity: Set(capacity),
            available_spots: Set(capacity),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed dining event")
    }

    /// Waits until the event loop has drained pending notifications.
    pub async fn settle_events(&self) {
        for _ in 0..20 {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            tokio::task::yield_now().await;
        }
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

/// Signs a webhook body the way the processor would.
pub fn webhook_headers(body: &[u8]) -> Vec<(String, String)> {
    let timestamp = Utc::now().timestamp().to_string();
    let mut mac = Hmac::<Sha256>::new_from_slice(WEBHOOK_SECRET.as_bytes()).expect("hmac key");
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(body);
    let signature = hex::encode(mac.finalize().into_bytes());
    vec![
        ("content-type".to_string(), "application/json".to_string()),
        ("x-timestamp".to_string(), timestamp),
        ("x-signature".to_string(), signature),
    ]
}

/// Reads a response body as JSON.
pub async fn response_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response body should be JSON")
    };
    (status, json)
}

/// Parses a decimal field from a JSON body (serialized as a string).
pub fn dec_field(value: &Value, key: &str) -> Decimal {
    value[key]
        .as_str()
        .unwrap_or_else(|| panic!("field '{}' missing in {}", key, value))
        .parse()
        .unwrap_or_else(|_| panic!("field '{}' is not a decimal", key))
}

/// Convenience helpers for common seed shapes.
pub fn required_size_group(option_name: &str, adjustment: Decimal) -> ModifierGroup {
    ModifierGroup {
        id: "size".to_string(),
        name: "Size".to_string(),
        required: true,
        max_selections: Some(1),
        options: vec![ModifierOption {
            id: "large".to_string(),
            name: option_name.to_string(),
            price_adjustment: adjustment,
        }],
    }
}
