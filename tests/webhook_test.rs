mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, webhook_headers, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a card order reconciled against session `cs_live_42`.
async fn card_order(app: &TestApp) -> String {
    let item = app
        .seed_menu_item("Ramen", dec!(14.00), vec![], vec![])
        .await;

    let response = app.request(Method::POST, "/api/v1/carts", None).await;
    let (_, body) = response_json(response).await;
    let cart_id = body["data"]["id"].as_str().expect("cart id").to_string();

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/carts/{}/items", cart_id),
            Some(json!({"menu_item_id": item.id, "quantity": 1})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .request(
            Method::POST,
            "/api/v1/checkout",
            Some(json!({
                "cart_id": cart_id,
                "customer_name": "Ada Lovelace",
                "customer_email": "ada@example.com",
                "customer_phone": "555-0100",
                "order_type": "pickup",
                "payment_method": "card",
            })),
        )
        .await;
    let (status, body) = response_json(response).await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["order_id"].as_str().expect("order id").to_string()
}

async fn mock_processor() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session_id": "cs_live_42",
            "redirect_url": "https://pay.example.com/cs_live_42"
        })))
        .mount(&server)
        .await;
    server
}

async fn post_webhook(app: &TestApp, body: serde_json::Value) -> axum::response::Response {
    let bytes = serde_json::to_vec(&body).expect("serialize webhook");
    let headers = webhook_headers(&bytes);
    let header_refs: Vec<(&str, &str)> = headers
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect();
    app.request_raw(Method::POST, "/api/v1/webhooks/payment", bytes, &header_refs)
        .await
}

#[tokio::test]
async fn completed_event_confirms_the_order() {
    let server = mock_processor().await;
    let app = TestApp::with_checkout_url(&server.uri()).await;
    let order_id = card_order(&app).await;

    let response = post_webhook(
        &app,
        json!({
            "id": "evt_1",
            "type": "checkout.completed",
            "data": {"session_id": "cs_live_42"}
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(Method::GET, &format!("/api/v1/orders/{}", order_id), None)
        .await;
    let (_, body) = response_json(response).await;
    assert_eq!(body["data"]["status"], "payment_confirmed");
    assert_eq!(body["data"]["payment_status"], "confirmed");
}

#[tokio::test]
async fn duplicate_delivery_is_a_success_no_op() {
    let server = mock_processor().await;
    let app = TestApp::with_checkout_url(&server.uri()).await;
    let order_id = card_order(&app).await;

    let event = json!({
        "id": "evt_1",
        "type": "checkout.completed",
        "data": {"session_id": "cs_live_42"}
    });
    assert_eq!(post_webhook(&app, event.clone()).await.status(), StatusCode::OK);
    assert_eq!(post_webhook(&app, event).await.status(), StatusCode::OK);

    let response = app
        .request(Method::GET, &format!("/api/v1/orders/{}", order_id), None)
        .await;
    let (_, body) = response_json(response).await;
    assert_eq!(body["data"]["payment_status"], "confirmed");
}

#[tokio::test]
async fn metadata_order_id_is_the_reconciliation_fallback() {
    let server = mock_processor().await;
    let app = TestApp::with_checkout_url(&server.uri()).await;
    let order_id = card_order(&app).await;

    // No matching session reference, but metadata carries the order id.
    let response = post_webhook(
        &app,
        json!({
            "id": "evt_2",
            "type": "checkout.completed",
            "data": {
                "session_id": "cs_other_session",
                "metadata": {"order_id": order_id}
            }
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(Method::GET, &format!("/api/v1/orders/{}", order_id), None)
        .await;
    let (_, body) = response_json(response).await;
    assert_eq!(body["data"]["payment_status"], "confirmed");
}

#[tokio::test]
async fn payment_failed_marks_payment_but_keeps_the_order() {
    let server = mock_processor().await;
    let app = TestApp::with_checkout_url(&server.uri()).await;
    let order_id = card_order(&app).await;

    let response = post_webhook(
        &app,
        json!({
            "id": "evt_3",
            "type": "payment.failed",
            "data": {"session_id": "cs_live_42"}
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(Method::GET, &format!("/api/v1/orders/{}", order_id), None)
        .await;
    let (_, body) = response_json(response).await;
    assert_eq!(body["data"]["payment_status"], "failed");
    assert_eq!(body["data"]["status"], "awaiting_payment");
}

#[tokio::test]
async fn unknown_reference_is_acknowledged() {
    let app = TestApp::new().await;
    let response = post_webhook(
        &app,
        json!({
            "id": "evt_4",
            "type": "checkout.completed",
            "data": {"session_id": "cs_nobody_knows"}
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn bad_signature_is_rejected_without_processing() {
    let server = mock_processor().await;
    let app = TestApp::with_checkout_url(&server.uri()).await;
    let order_id = card_order(&app).await;

    let body = serde_json::to_vec(&json!({
        "id": "evt_5",
        "type": "checkout.completed",
        "data": {"session_id": "cs_live_42"}
    }))
    .expect("serialize webhook");
    let timestamp = chrono::Utc::now().timestamp().to_string();
    let response = app
        .request_raw(
            Method::POST,
            "/api/v1/webhooks/payment",
            body,
            &[
                ("content-type", "application/json"),
                ("x-timestamp", timestamp.as_str()),
                ("x-signature", "deadbeef"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request(Method::GET, &format!("/api/v1/orders/{}", order_id), None)
        .await;
    let (_, body) = response_json(response).await;
    assert_eq!(body["data"]["payment_status"], "unpaid");
}

#[tokio::test]
async fn missing_signature_headers_are_rejected() {
    let app = TestApp::new().await;
    let response = app
        .request_raw(
            Method::POST,
            "/api/v1/webhooks/payment",
            b"{}".to_vec(),
            &[("content-type", "application/json")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
