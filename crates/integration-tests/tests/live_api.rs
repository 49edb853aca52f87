//! Tests against a running API server.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`slh-cli migrate`)
//! - The API server running (`cargo run -p slh-shop-api`)
//!
//! Run with: cargo test -p slh-shop-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

/// Base URL for the API (configurable via environment).
fn base_url() -> String {
    std::env::var("SHOP_API_URL").unwrap_or_else(|_| "http://127.0.0.1:8080".to_string())
}

/// A Telegram id unlikely to collide with real users or earlier runs.
fn test_telegram_id() -> i64 {
    -chrono::Utc::now().timestamp_micros()
}

#[tokio::test]
#[ignore = "requires a running API server"]
async fn test_live_health() {
    let resp = Client::new()
        .get(format!("{}/health/ready", base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "requires a running API server"]
async fn test_live_order_flow() {
    let client = Client::new();
    let base = base_url();

    let user: Value = client
        .post(format!("{base}/users/sync"))
        .json(&json!({ "telegram_id": test_telegram_id(), "display_name": "Live Test" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let user_id = user["id"].as_str().unwrap();

    let shop: Value = client
        .post(format!("{base}/users/{user_id}/shops/default"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let item: Value = client
        .post(format!("{base}/shops/{}/items/default", shop["id"].as_str().unwrap()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let resp = client
        .post(format!("{base}/orders"))
        .json(&json!({
            "buyer_user_id": user_id,
            "shop_id": shop["id"],
            "item_id": item["id"],
            "payment_method": "slh",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = resp.json().await.unwrap();
    assert_eq!(created["order"]["amount_slh"], "39.0");

    let form = reqwest::multipart::Form::new()
        .text("order_id", created["order"]["id"].as_str().unwrap().to_string())
        .part(
            "file",
            reqwest::multipart::Part::bytes(b"live proof".to_vec()).file_name("proof.jpg"),
        );
    let resp = client
        .post(format!("{base}/payments/upload-proof"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let receipt: Value = resp.json().await.unwrap();
    assert_eq!(receipt["status"], "waiting_verification");

    let proof = client
        .get(format!(
            "{base}{}",
            receipt["payment_proof_url"].as_str().unwrap()
        ))
        .send()
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    assert_eq!(&proof[..], b"live proof");
}
