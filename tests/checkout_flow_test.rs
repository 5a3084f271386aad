mod common;

use axum::http::{Method, StatusCode};
use common::{dec_field, required_size_group, response_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn cart_with_sized_item(app: &TestApp) -> String {
    let item = app
        .seed_menu_item(
            "House Special",
            dec!(10.00),
            vec![required_size_group("Large", dec!(2.00))],
            vec![],
        )
        .await;

    let response = app.request(Method::POST, "/api/v1/carts", None).await;
    let (_, body) = response_json(response).await;
    let cart_id = body["data"]["id"].as_str().expect("cart id").to_string();

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/carts/{}/items", cart_id),
            Some(json!({
                "menu_item_id": item.id,
                "quantity": 1,
                "modifiers": [{"group_id": "size", "option_id": "large", "quantity": 1}]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    cart_id
}

fn checkout_body(cart_id: &str, order_type: &str, payment_method: &str) -> serde_json::Value {
    json!({
        "cart_id": cart_id,
        "customer_name": "Ada Lovelace",
        "customer_email": "ada@example.com",
        "customer_phone": "555-0100",
        "order_type": order_type,
        "payment_method": payment_method,
    })
}

#[tokio::test]
async fn cash_pickup_checkout_confirms_immediately() {
    let app = TestApp::new().await;
    let cart_id = cart_with_sized_item(&app).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/checkout",
            Some(checkout_body(&cart_id, "pickup", "cash")),
        )
        .await;
    let (status, body) = response_json(response).await;
    assert_eq!(status, StatusCode::CREATED);

    let data = &body["data"];
    assert_eq!(dec_field(data, "total_amount"), dec!(12.96));
    assert_eq!(data["status"], "payment_confirmed");
    assert_eq!(data["payment_status"], "unpaid"); // cash settles at handover
    assert!(data["redirect_url"].is_null());
    let order_number = data["order_number"].as_str().expect("order number");
    assert!(order_number.starts_with("ORD-"));

    // Totals on the persisted order reconcile
    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/orders/{}", order_number),
            None,
        )
        .await;
    let (status, body) = response_json(response).await;
    assert_eq!(status, StatusCode::OK);
    let order = &body["data"];
    assert_eq!(dec_field(order, "subtotal"), dec!(12.00));
    assert_eq!(dec_field(order, "tax_amount"), dec!(0.96));
    assert_eq!(dec_field(order, "delivery_fee"), dec!(0));
    assert_eq!(dec_field(order, "total_amount"), dec!(12.96));
    assert_eq!(order["items"].as_array().map(Vec::len), Some(1));

    // Cart was consumed by checkout
    let response = app
        .request(Method::GET, &format!("/api/v1/carts/{}", cart_id), None)
        .await;
    let (status, body) = response_json(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "converted");
    assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn delivery_orders_add_the_flat_fee() {
    let app = TestApp::new().await;
    let cart_id = cart_with_sized_item(&app).await;

    let mut body = checkout_body(&cart_id, "delivery", "cash");
    body["delivery_address"] = json!("1 Main St, Springfield");

    let response = app
        .request(Method::POST, "/api/v1/checkout", Some(body))
        .await;
    let (status, body) = response_json(response).await;
    assert_eq!(status, StatusCode::CREATED);
    // 12.00 + 0.96 tax + 5.00 delivery
    assert_eq!(dec_field(&body["data"], "total_amount"), dec!(17.96));
}

#[tokio::test]
async fn delivery_without_address_is_rejected() {
    let app = TestApp::new().await;
    let cart_id = cart_with_sized_item(&app).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/checkout",
            Some(checkout_body(&cart_id, "delivery", "cash")),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn empty_cart_cannot_be_checked_out() {
    let app = TestApp::new().await;
    let response = app.request(Method::POST, "/api/v1/carts", None).await;
    let (_, body) = response_json(response).await;
    let cart_id = body["data"]["id"].as_str().expect("cart id").to_string();

    let response = app
        .request(
            Method::POST,
            "/api/v1/checkout",
            Some(checkout_body(&cart_id, "pickup", "cash")),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn double_checkout_of_the_same_cart_is_rejected() {
    let app = TestApp::new().await;
    let cart_id = cart_with_sized_item(&app).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/checkout",
            Some(checkout_body(&cart_id, "pickup", "cash")),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .request(
            Method::POST,
            "/api/v1/checkout",
            Some(checkout_body(&cart_id, "pickup", "cash")),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn card_checkout_returns_the_hosted_redirect() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session_id": "cs_test_777",
            "redirect_url": "https://pay.example.com/cs_test_777"
        })))
        .mount(&server)
        .await;

    let app = TestApp::with_checkout_url(&server.uri()).await;
    let cart_id = cart_with_sized_item(&app).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/checkout",
            Some(checkout_body(&cart_id, "pickup", "card")),
        )
        .await;
    let (status, body) = response_json(response).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "awaiting_payment");
    assert_eq!(
        body["data"]["redirect_url"],
        "https://pay.example.com/cs_test_777"
    );

    // The session reference was written back for webhook reconciliation
    let order_id = body["data"]["order_id"].as_str().expect("order id");
    let response = app
        .request(Method::GET, &format!("/api/v1/orders/{}", order_id), None)
        .await;
    let (_, body) = response_json(response).await;
    assert_eq!(body["data"]["external_payment_ref"], "cs_test_777");
}

#[tokio::test]
async fn failed_session_creation_cancels_the_provisional_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let app = TestApp::with_checkout_url(&server.uri()).await;
    let cart_id = cart_with_sized_item(&app).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/checkout",
            Some(checkout_body(&cart_id, "pickup", "card")),
        )
        .await;
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);

    // No order is left awaiting payment
    let response = app
        .request(Method::GET, "/api/v1/orders?status=awaiting_payment", None)
        .await;
    let (status, body) = response_json(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(0));

    let response = app
        .request(Method::GET, "/api/v1/orders?status=cancelled", None)
        .await;
    let (_, body) = response_json(response).await;
    assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn checkout_sends_an_order_received_email() {
    let app = TestApp::new().await;
    let cart_id = cart_with_sized_item(&app).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/checkout",
            Some(checkout_body(&cart_id, "pickup", "cash")),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    app.settle_events().await;
    let sent = app.mailer.sent();
    assert!(!sent.is_empty(), "expected an order confirmation email");
    assert_eq!(sent[0].to, "ada@example.com");
    assert!(sent[0].subject.contains("received"));
}
