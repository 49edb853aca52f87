//! Integration tests for SLH Shop Core.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process tests (memory store, no database needed)
//! cargo test -p slh-shop-integration-tests
//!
//! # Live tests against a running API (SHOP_API_URL, default http://127.0.0.1:8080)
//! cargo test -p slh-shop-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `api_*` - REST API through the full router and middleware stack
//! - `bot_*` - Bot handlers against an API served on an ephemeral port
//! - `live_api` - `#[ignore]`d tests against a deployed server

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use secrecy::SecretString;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use url::Url;

use slh_shop_api::config::{ApiConfig, OrderPolicy, PaymentConfig};
use slh_shop_api::db::MemoryStore;
use slh_shop_api::state::AppState;

const MULTIPART_BOUNDARY: &str = "slh-shop-test-boundary";

/// A fully wired API over the memory store and a temporary upload directory.
pub struct TestApp {
    pub state: AppState,
    router: Router,
    uploads: TempDir,
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        Self::build(None)
    }

    /// An app whose approve endpoint requires `token`.
    #[must_use]
    pub fn with_operator_token(token: &str) -> Self {
        Self::build(Some(SecretString::from(token.to_string())))
    }

    fn build(operator_token: Option<SecretString>) -> Self {
        let uploads = tempfile::tempdir().unwrap();
        let config = ApiConfig {
            database_url: SecretString::from("postgres://unused".to_string()),
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            upload_dir: uploads.path().to_path_buf(),
            payment: PaymentConfig::default(),
            orders: OrderPolicy::default(),
            operator_token,
            sentry_dsn: None,
            sentry_environment: None,
        };
        let state = AppState::new(config, Arc::new(MemoryStore::new()));
        let router = slh_shop_api::build_router(state.clone());

        Self {
            state,
            router,
            uploads,
        }
    }

    #[must_use]
    pub fn upload_dir(&self) -> &Path {
        self.uploads.path()
    }

    /// Number of files in the upload directory.
    #[must_use]
    pub fn stored_proofs(&self) -> usize {
        std::fs::read_dir(self.uploads.path())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    /// Send a request through the router.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, body)
    }

    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(path).body(Body::empty()).unwrap();
        let (status, _, body) = self.send(request).await;
        (status, parse_json(&body))
    }

    pub async fn post(&self, path: &str, body: &Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, _, body) = self.send(request).await;
        (status, parse_json(&body))
    }

    /// `POST` without a body.
    pub async fn post_empty(&self, path: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let (status, _, body) = self.send(request).await;
        (status, parse_json(&body))
    }

    /// Upload a proof with the given text fields and optional file.
    pub async fn upload_proof(
        &self,
        fields: &[(&str, String)],
        file: Option<&[u8]>,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/payments/upload-proof")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
            )
            .body(Body::from(multipart_body(fields, file)))
            .unwrap();
        let (status, _, body) = self.send(request).await;
        (status, parse_json(&body))
    }

    /// Serve the router on an ephemeral local port and return its base URL.
    pub async fn serve(&self) -> Url {
        let listener = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        let router = self.router.clone();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Url::parse(&format!("http://{addr}")).unwrap()
    }

    /// Sync a user and return their JSON record.
    pub async fn user(&self, telegram_id: i64, name: &str) -> Value {
        let (status, user) = self
            .post(
                "/users/sync",
                &serde_json::json!({ "telegram_id": telegram_id, "display_name": name }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{user}");
        user
    }

    /// Sync a user, ensure their default shop and item, and place an SLH order.
    ///
    /// Returns `(user, shop, item, order_with_payment)`.
    pub async fn demo_order(&self, telegram_id: i64, name: &str) -> (Value, Value, Value, Value) {
        let user = self.user(telegram_id, name).await;
        let (_, shop) = self
            .post_empty(&format!("/users/{}/shops/default", user["id"].as_str().unwrap()))
            .await;
        let (_, item) = self
            .post_empty(&format!("/shops/{}/items/default", shop["id"].as_str().unwrap()))
            .await;
        let (status, created) = self
            .post(
                "/orders",
                &serde_json::json!({
                    "buyer_user_id": user["id"],
                    "shop_id": shop["id"],
                    "item_id": item["id"],
                    "payment_method": "slh",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{created}");
        (user, shop, item, created)
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode a JSON body, or `Value::Null` for empty and non-JSON bodies.
#[must_use]
pub fn parse_json(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap_or(Value::Null)
}

fn multipart_body(fields: &[(&str, String)], file: Option<&[u8]>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(bytes) = file {
        body.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"proof.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}--\r\n").as_bytes());
    body
}
