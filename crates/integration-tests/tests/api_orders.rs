//! Order lifecycle through the full router.

#![allow(clippy::unwrap_used)]

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use rust_decimal::Decimal;
use serde_json::json;

use slh_shop_api::config::DEFAULT_SLH_ADDRESS;
use slh_shop_core::models::OrderWithPayment;
use slh_shop_core::{OrderStatus, PaymentMethod};
use slh_shop_integration_tests::TestApp;

#[tokio::test]
async fn test_ava_buys_a_love_card() {
    let app = TestApp::new();

    let (user, shop, item, created) = app.demo_order(42, "Ava").await;
    assert_eq!(user["telegram_id"], 42);
    assert_eq!(user["display_name"], "Ava");
    assert_eq!(shop["owner_user_id"], user["id"]);
    assert_eq!(shop["status"], "active");
    assert_eq!(item["name"], "Love Card 39 NIS");
    assert_eq!(item["price_slh"], "39.0");

    let order = &created["order"];
    let pay = &created["payment_instructions"];
    assert_eq!(order["status"], "pending");
    assert_eq!(order["amount_slh"], "39.0");
    assert!(order["amount_bnb"].is_null());
    assert_eq!(pay["amount"], "39.0");
    assert_eq!(pay["symbol"], "SLH");
    assert_eq!(pay["to_address"], DEFAULT_SLH_ADDRESS);
    assert_eq!(pay["chain_id"], 56);

    // The body decodes into the shared models the bot uses
    let typed: OrderWithPayment = serde_json::from_value(created.clone()).unwrap();
    assert_eq!(typed.order.status, OrderStatus::Pending);
    assert_eq!(
        typed.order.settlement(),
        Some((PaymentMethod::Slh, Decimal::new(390, 1)))
    );
    assert_eq!(typed.payment_instructions.amount, Decimal::new(390, 1));

    let order_id = order["id"].as_str().unwrap().to_string();
    let (status, receipt) = app
        .upload_proof(&[("order_id", order_id.clone())], Some(b"\x89PNG proof"))
        .await;
    assert_eq!(status, StatusCode::OK, "{receipt}");
    assert_eq!(receipt["order_id"], order_id.as_str());
    assert_eq!(receipt["resolved_by"], "explicit");
    assert_eq!(receipt["status"], "waiting_verification");

    let (_, stored) = app.get(&format!("/orders/{order_id}")).await;
    assert_eq!(stored["status"], "waiting_verification");
    assert_eq!(stored["payment_proof_url"], receipt["payment_proof_url"]);

    let (status, paid) = app
        .post_empty(&format!("/payments/approve/{order_id}"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["status"], "paid");
    assert_eq!(paid["payment_proof_url"], receipt["payment_proof_url"]);

    // Approving again changes nothing
    let (status, again) = app
        .post_empty(&format!("/payments/approve/{order_id}"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["status"], "paid");

    let (_, orders) = app
        .get(&format!("/users/{}/orders", user["id"].as_str().unwrap()))
        .await;
    assert_eq!(orders.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_order_without_price_in_method_is_rejected() {
    let app = TestApp::new();
    let user = app.user(7, "Noa").await;
    let (_, shop) = app
        .post(
            "/shops",
            &json!({ "owner_user_id": user["id"], "title": "BNB Corner" }),
        )
        .await;
    let shop_id = shop["id"].as_str().unwrap();

    let (status, item) = app
        .post(
            &format!("/shops/{shop_id}/items"),
            &json!({ "name": "BNB only", "price_bnb": "0.05" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(item["price_slh"].is_null());

    let (status, body) = app
        .post(
            "/orders",
            &json!({
                "buyer_user_id": user["id"],
                "shop_id": shop_id,
                "item_id": item["id"],
                "payment_method": "slh",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_input");

    let (status, created) = app
        .post(
            "/orders",
            &json!({
                "buyer_user_id": user["id"],
                "shop_id": shop_id,
                "item_id": item["id"],
                "payment_method": "bnb",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["order"]["amount_bnb"], "0.05");
    assert_eq!(created["payment_instructions"]["symbol"], "BNB");
}

#[tokio::test]
async fn test_order_with_unknown_references_inserts_nothing() {
    let app = TestApp::new();
    let (user, shop, item, _) = app.demo_order(1, "Dana").await;
    let missing = "00000000-0000-4000-8000-000000000000";

    for body in [
        json!({ "buyer_user_id": missing, "shop_id": shop["id"], "item_id": item["id"] }),
        json!({ "buyer_user_id": user["id"], "shop_id": missing, "item_id": item["id"] }),
        json!({ "buyer_user_id": user["id"], "shop_id": shop["id"], "item_id": missing }),
    ] {
        let (status, error) = app.post("/orders", &body).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{body}");
        assert_eq!(error["error"]["code"], "not_found");
    }

    let (_, orders) = app
        .get(&format!("/users/{}/orders", user["id"].as_str().unwrap()))
        .await;
    assert_eq!(orders.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_item_from_another_shop_is_rejected() {
    let app = TestApp::new();
    let (buyer, shop, _, _) = app.demo_order(10, "Buyer").await;
    let (_, _, other_item, _) = app.demo_order(11, "Seller").await;

    let (status, body) = app
        .post(
            "/orders",
            &json!({
                "buyer_user_id": buyer["id"],
                "shop_id": shop["id"],
                "item_id": other_item["id"],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_input");
}

#[tokio::test]
async fn test_approve_requires_operator_token_when_configured() {
    let token = "q8Zt3LmX0vRw7NbKc2HyJ5sUe9GfDa4P";
    let app = TestApp::with_operator_token(token);
    let (_, _, _, created) = app.demo_order(5, "Ori").await;
    let path = format!(
        "/payments/approve/{}",
        created["order"]["id"].as_str().unwrap()
    );

    let (status, body) = app.post_empty(&path).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "unauthorized");

    let wrong = Request::builder()
        .method(Method::POST)
        .uri(&path)
        .header(header::AUTHORIZATION, "Bearer not-the-token")
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = app.send(wrong).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let right = Request::builder()
        .method(Method::POST)
        .uri(&path)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = app.send(right).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        slh_shop_integration_tests::parse_json(&body)["status"],
        "paid"
    );
}

#[tokio::test]
async fn test_expiry_only_touches_pending_orders() {
    let app = TestApp::new();
    let (user, shop, item, first) = app.demo_order(3, "Gal").await;
    let first_id = first["order"]["id"].as_str().unwrap().to_string();

    let (_, second) = app
        .post(
            "/orders",
            &json!({
                "buyer_user_id": user["id"],
                "shop_id": shop["id"],
                "item_id": item["id"],
            }),
        )
        .await;
    let second_id = second["order"]["id"].as_str().unwrap().to_string();

    // The second order has a proof under review
    let (status, _) = app
        .upload_proof(&[("order_id", second_id.clone())], Some(b"proof"))
        .await;
    assert_eq!(status, StatusCode::OK);

    let cutoff = chrono::Utc::now() + chrono::TimeDelta::seconds(1);
    let expired = app
        .state
        .orders()
        .expire_created_before(cutoff)
        .await
        .unwrap();
    assert_eq!(expired, 1);

    let (_, first) = app.get(&format!("/orders/{first_id}")).await;
    let (_, second) = app.get(&format!("/orders/{second_id}")).await;
    assert_eq!(first["status"], "expired");
    assert_eq!(second["status"], "waiting_verification");

    // Expired orders no longer accept proofs
    let before = app.stored_proofs();
    let (status, body) = app
        .upload_proof(&[("order_id", first_id.clone())], Some(b"late proof"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_input");
    assert_eq!(app.stored_proofs(), before);

    // Operators can still approve a late payment
    let (status, paid) = app
        .post_empty(&format!("/payments/approve/{first_id}"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["status"], "paid");
}
