mod common;

use axum::http::{Method, StatusCode};
use common::{dec_field, required_size_group, response_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;
use tableside_api::entities::menu_item::{
    ModifierGroup, ModifierOption, UpsellOffer,
};

async fn create_cart(app: &TestApp) -> String {
    let response = app.request(Method::POST, "/api/v1/carts", None).await;
    let (status, body) = response_json(response).await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["id"].as_str().expect("cart id").to_string()
}

#[tokio::test]
async fn add_item_prices_modifiers_per_unit() {
    let app = TestApp::new().await;
    let item = app
        .seed_menu_item(
            "Pad Thai",
            dec!(12.00),
            vec![ModifierGroup {
                id: "spice".into(),
                name: "Spice".into(),
                required: false,
                max_selections: None,
                options: vec![ModifierOption {
                    id: "extra".into(),
                    name: "Extra spice".into(),
                    price_adjustment: dec!(1.50),
                }],
            }],
            vec![],
        )
        .await;
    let cart_id = create_cart(&app).await;

    // base $12 + $1.50 x 2 applications, quantity 1 -> $15.00
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/carts/{}/items", cart_id),
            Some(json!({
                "menu_item_id": item.id,
                "quantity": 1,
                "modifiers": [{"group_id": "spice", "option_id": "extra", "quantity": 2}]
            })),
        )
        .await;
    let (status, body) = response_json(response).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(dec_field(&body["data"], "total_price"), dec!(15.00));
}

#[tokio::test]
async fn upsells_do_not_scale_with_item_quantity() {
    let app = TestApp::new().await;
    let item = app
        .seed_menu_item(
            "Green Curry",
            dec!(15.00),
            vec![],
            vec![UpsellOffer {
                id: "spring-rolls".into(),
                name: "Spring rolls".into(),
                price: dec!(2.00),
            }],
        )
        .await;
    let cart_id = create_cart(&app).await;

    // qty 2: 15 x 2 + 2 x 3 = $36.00 (upsells independent of quantity)
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/carts/{}/items", cart_id),
            Some(json!({
                "menu_item_id": item.id,
                "quantity": 2,
                "upsells": [{"upsell_id": "spring-rolls", "quantity": 3}]
            })),
        )
        .await;
    let (status, body) = response_json(response).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(dec_field(&body["data"], "total_price"), dec!(36.00));
}

#[tokio::test]
async fn missing_required_modifier_is_rejected() {
    let app = TestApp::new().await;
    let item = app
        .seed_menu_item(
            "Noodles",
            dec!(10.00),
            vec![required_size_group("Large", dec!(2.00))],
            vec![],
        )
        .await;
    let cart_id = create_cart(&app).await;

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/carts/{}/items", cart_id),
            Some(json!({"menu_item_id": item.id, "quantity": 1})),
        )
        .await;
    let (status, body) = response_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap_or_default().contains("Size"));
}

#[tokio::test]
async fn max_selections_is_enforced_across_options() {
    let app = TestApp::new().await;
    let item = app
        .seed_menu_item(
            "Salad",
            dec!(9.00),
            vec![ModifierGroup {
                id: "toppings".into(),
                name: "Toppings".into(),
                required: false,
                max_selections: Some(2),
                options: vec![
                    ModifierOption {
                        id: "avocado".into(),
                        name: "Avocado".into(),
                        price_adjustment: dec!(1.00),
                    },
                    ModifierOption {
                        id: "feta".into(),
                        name: "Feta".into(),
                        price_adjustment: dec!(0.75),
                    },
                ],
            }],
            vec![],
        )
        .await;
    let cart_id = create_cart(&app).await;

    // 2 + 1 selections exceed the cap of 2
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/carts/{}/items", cart_id),
            Some(json!({
                "menu_item_id": item.id,
                "quantity": 1,
                "modifiers": [
                    {"group_id": "toppings", "option_id": "avocado", "quantity": 2},
                    {"group_id": "toppings", "option_id": "feta", "quantity": 1}
                ]
            })),
        )
        .await;
    let (status, _) = response_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_option_is_rejected_not_ignored() {
    let app = TestApp::new().await;
    let item = app.seed_menu_item("Soup", dec!(7.00), vec![], vec![]).await;
    let cart_id = create_cart(&app).await;

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/carts/{}/items", cart_id),
            Some(json!({
                "menu_item_id": item.id,
                "quantity": 1,
                "modifiers": [{"group_id": "nope", "option_id": "nothing", "quantity": 1}]
            })),
        )
        .await;
    let (status, _) = response_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn quantity_update_rescales_and_recomputes_totals() {
    let app = TestApp::new().await;
    let item = app
        .seed_menu_item(
            "Bowl",
            dec!(10.00),
            vec![required_size_group("Large", dec!(2.00))],
            vec![UpsellOffer {
                id: "drink".into(),
                name: "Iced tea".into(),
                price: dec!(3.00),
            }],
        )
        .await;
    let cart_id = create_cart(&app).await;

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/carts/{}/items", cart_id),
            Some(json!({
                "menu_item_id": item.id,
                "quantity": 1,
                "modifiers": [{"group_id": "size", "option_id": "large", "quantity": 1}],
                "upsells": [{"upsell_id": "drink", "quantity": 1}]
            })),
        )
        .await;
    let (status, body) = response_json(response).await;
    assert_eq!(status, StatusCode::CREATED);
    let item_id = body["data"]["id"].as_str().expect("item id").to_string();
    // (10 + 2) x 1 + 3 = 15
    assert_eq!(dec_field(&body["data"], "total_price"), dec!(15.00));

    // (10 + 2) x 3 + 3 = 39; only the item portion scales
    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/carts/{}/items/{}", cart_id, item_id),
            Some(json!({"quantity": 3})),
        )
        .await;
    let (status, body) = response_json(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dec_field(&body["data"]["items"][0], "total_price"), dec!(39.00));
    assert_eq!(dec_field(&body["data"], "subtotal"), dec!(39.00));
    // 8% tax, rounded to cents
    assert_eq!(dec_field(&body["data"], "tax_amount"), dec!(3.12));
}

#[tokio::test]
async fn quantity_below_one_removes_the_line() {
    let app = TestApp::new().await;
    let item = app.seed_menu_item("Rice", dec!(4.00), vec![], vec![]).await;
    let cart_id = create_cart(&app).await;

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/carts/{}/items", cart_id),
            Some(json!({"menu_item_id": item.id, "quantity": 2})),
        )
        .await;
    let (status, body) = response_json(response).await;
    assert_eq!(status, StatusCode::CREATED);
    let item_id = body["data"]["id"].as_str().expect("item id").to_string();

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/carts/{}/items/{}", cart_id, item_id),
            Some(json!({"quantity": 0})),
        )
        .await;
    let (status, body) = response_json(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(0));
    assert_eq!(dec_field(&body["data"], "total_amount"), dec!(0));
}

#[tokio::test]
async fn identical_items_stay_separate_lines() {
    let app = TestApp::new().await;
    let item = app.seed_menu_item("Dumplings", dec!(6.00), vec![], vec![]).await;
    let cart_id = create_cart(&app).await;

    for _ in 0..2 {
        let response = app
            .request(
                Method::POST,
                &format!("/api/v1/carts/{}/items", cart_id),
                Some(json!({"menu_item_id": item.id, "quantity": 1})),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .request(Method::GET, &format!("/api/v1/carts/{}", cart_id), None)
        .await;
    let (status, body) = response_json(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(2));
    assert_eq!(dec_field(&body["data"], "subtotal"), dec!(12.00));
}

#[tokio::test]
async fn clearing_a_cart_zeroes_totals() {
    let app = TestApp::new().await;
    let item = app.seed_menu_item("Tea", dec!(3.00), vec![], vec![]).await;
    let cart_id = create_cart(&app).await;

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/carts/{}/items", cart_id),
            Some(json!({"menu_item_id": item.id, "quantity": 4})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .request(Method::DELETE, &format!("/api/v1/carts/{}", cart_id), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .request(Method::GET, &format!("/api/v1/carts/{}", cart_id), None)
        .await;
    let (status, body) = response_json(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(0));
    assert_eq!(dec_field(&body["data"], "total_amount"), dec!(0));
}

#[tokio::test]
async fn unknown_cart_is_a_404() {
    let app = TestApp::new().await;
    let response = app
        .request(
            Method::GET,
            "/api/v1/carts/00000000-0000-0000-0000-000000000000",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
