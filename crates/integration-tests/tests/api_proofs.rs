//! Payment proof ingestion through the full router.

#![allow(clippy::unwrap_used)]

use axum::body::Body;
use axum::http::{Request, StatusCode};

use slh_shop_integration_tests::TestApp;

#[tokio::test]
async fn test_proof_is_served_back() {
    let app = TestApp::new();
    let (_, _, _, created) = app.demo_order(42, "Ava").await;
    let order_id = created["order"]["id"].as_str().unwrap().to_string();

    let bytes = b"\x89PNG\r\n\x1a\nnot really a png".as_slice();
    let (status, receipt) = app
        .upload_proof(&[("order_id", order_id)], Some(bytes))
        .await;
    assert_eq!(status, StatusCode::OK, "{receipt}");

    let url = receipt["payment_proof_url"].as_str().unwrap();
    assert!(url.starts_with("/uploaded_proofs/"));
    assert!(url.ends_with(".png"));

    let request = Request::builder().uri(url).body(Body::empty()).unwrap();
    let (status, _, body) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], bytes);
}

#[tokio::test]
async fn test_buyer_fallback_uses_latest_order() {
    let app = TestApp::new();
    let (user, shop, item, _) = app.demo_order(9, "Lior").await;
    let (_, latest) = app
        .post(
            "/orders",
            &serde_json::json!({
                "buyer_user_id": user["id"],
                "shop_id": shop["id"],
                "item_id": item["id"],
            }),
        )
        .await;

    let buyer = user["id"].as_str().unwrap().to_string();
    let (status, receipt) = app
        .upload_proof(&[("buyer_user_id", buyer)], Some(b"proof"))
        .await;
    assert_eq!(status, StatusCode::OK, "{receipt}");
    assert_eq!(receipt["resolved_by"], "latest_for_buyer");
    assert_eq!(receipt["order_id"], latest["order"]["id"]);
}

#[tokio::test]
async fn test_explicit_order_wins_over_buyer() {
    let app = TestApp::new();
    let (user, shop, item, first) = app.demo_order(9, "Lior").await;
    app.post(
        "/orders",
        &serde_json::json!({
            "buyer_user_id": user["id"],
            "shop_id": shop["id"],
            "item_id": item["id"],
        }),
    )
    .await;

    let (status, receipt) = app
        .upload_proof(
            &[
                ("order_id", first["order"]["id"].as_str().unwrap().to_string()),
                ("buyer_user_id", user["id"].as_str().unwrap().to_string()),
            ],
            Some(b"proof"),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(receipt["resolved_by"], "explicit");
    assert_eq!(receipt["order_id"], first["order"]["id"]);
}

#[tokio::test]
async fn test_empty_upload_writes_nothing() {
    let app = TestApp::new();
    let (_, _, _, created) = app.demo_order(1, "Tal").await;
    let order_id = created["order"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .upload_proof(&[("order_id", order_id.clone())], Some(b""))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_input");

    let (status, _) = app.upload_proof(&[("order_id", order_id.clone())], None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(app.stored_proofs(), 0);
    let (_, order) = app.get(&format!("/orders/{order_id}")).await;
    assert_eq!(order["status"], "pending");
}

#[tokio::test]
async fn test_unknown_order_leaves_no_file() {
    let app = TestApp::new();
    let user = app.user(2, "Yam").await;

    let (status, body) = app
        .upload_proof(
            &[("order_id", "00000000-0000-4000-8000-000000000000".to_string())],
            Some(b"proof"),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");

    // A buyer without orders has nothing to fall back to
    let (status, _) = app
        .upload_proof(
            &[("buyer_user_id", user["id"].as_str().unwrap().to_string())],
            Some(b"proof"),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(app.stored_proofs(), 0);
}

#[tokio::test]
async fn test_upload_needs_a_target() {
    let app = TestApp::new();

    let (status, body) = app.upload_proof(&[], Some(b"proof")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_input");

    let (status, _) = app
        .upload_proof(&[("order_id", "42".to_string())], Some(b"proof"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.stored_proofs(), 0);
}

#[tokio::test]
async fn test_second_proof_replaces_reference() {
    let app = TestApp::new();
    let (_, _, _, created) = app.demo_order(4, "Shir").await;
    let order_id = created["order"]["id"].as_str().unwrap().to_string();

    let (_, first) = app
        .upload_proof(&[("order_id", order_id.clone())], Some(b"blurry"))
        .await;
    let (status, second) = app
        .upload_proof(&[("order_id", order_id.clone())], Some(b"sharp"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(first["payment_proof_url"], second["payment_proof_url"]);

    let (_, order) = app.get(&format!("/orders/{order_id}")).await;
    assert_eq!(order["payment_proof_url"], second["payment_proof_url"]);
    assert_eq!(order["status"], "waiting_verification");
}
