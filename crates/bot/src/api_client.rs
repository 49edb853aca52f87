//! HTTP client for the shop API.
//!
//! Thin typed wrapper over the REST surface. Every call returns the API's
//! own records from `slh_shop_core::models`; error bodies are decoded into
//! [`ApiClientError::Api`] so callers can branch on the error code.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use slh_shop_core::models::{
    CreateOrder, ErrorBody, Item, OrderWithPayment, ProofReceipt, Shop, SyncUser, User,
};
use slh_shop_core::{OrderId, ShopId, UserId};

/// Timeout for JSON calls.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Timeout for proof uploads.
pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors returned by [`ShopApiClient`].
#[derive(Debug, Error)]
pub enum ApiClientError {
    /// The request never produced a response.
    #[error("Shop API request failed: {0}")]
    Request(String),

    /// The API answered with an error body.
    #[error("Shop API error {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// The response body was not what the endpoint promises.
    #[error("Shop API response could not be decoded: {0}")]
    Decode(String),
}

impl ApiClientError {
    /// Machine-readable error code, if the API sent one.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => Some(code),
            Self::Request(_) | Self::Decode(_) => None,
        }
    }

    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Request(_) | Self::Decode(_) => None,
        }
    }
}

/// Which order a proof upload is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofFor {
    /// A specific order.
    Order(OrderId),
    /// The buyer's most recent order.
    LatestOf(UserId),
}

/// Client for the shop REST API.
#[derive(Debug, Clone)]
pub struct ShopApiClient {
    client: Client,
    base_url: String,
}

impl ShopApiClient {
    /// Create a client for the API at `base_url`.
    #[must_use]
    pub fn new(base_url: &Url) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Register or refresh a Telegram user.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the API rejects it.
    #[instrument(skip(self, user), fields(telegram_id = user.telegram_id))]
    pub async fn sync_user(&self, user: &SyncUser) -> Result<User, ApiClientError> {
        let request = self.client.post(self.url("/users/sync")).json(user);
        send(request, REQUEST_TIMEOUT).await
    }

    /// The user's first shop, created when they have none.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the API rejects it.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn default_shop(&self, user_id: UserId) -> Result<Shop, ApiClientError> {
        let request = self
            .client
            .post(self.url(&format!("/users/{user_id}/shops/default")));
        send(request, REQUEST_TIMEOUT).await
    }

    /// The shop's first item, created when it has none.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the API rejects it.
    #[instrument(skip(self), fields(shop_id = %shop_id))]
    pub async fn default_item(&self, shop_id: ShopId) -> Result<Item, ApiClientError> {
        let request = self
            .client
            .post(self.url(&format!("/shops/{shop_id}/items/default")));
        send(request, REQUEST_TIMEOUT).await
    }

    /// Place an order and receive payment instructions.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the API rejects it.
    #[instrument(skip(self, order), fields(item_id = %order.item_id))]
    pub async fn create_order(
        &self,
        order: &CreateOrder,
    ) -> Result<OrderWithPayment, ApiClientError> {
        let request = self.client.post(self.url("/orders")).json(order);
        send(request, REQUEST_TIMEOUT).await
    }

    /// Look up a shop by its deep-link referral code.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or no shop has this code.
    #[instrument(skip(self))]
    pub async fn shop_by_referral(&self, code: &str) -> Result<Shop, ApiClientError> {
        let mut url = Url::parse(&self.url("/shops/by-referral/"))
            .map_err(|e| ApiClientError::Request(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| ApiClientError::Request("API base URL cannot hold a path".to_string()))?
            .pop_if_empty()
            .push(code);
        send(self.client.get(url), REQUEST_TIMEOUT).await
    }

    /// Items of a shop, oldest first.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the shop does not exist.
    #[instrument(skip(self), fields(shop_id = %shop_id))]
    pub async fn shop_items(&self, shop_id: ShopId) -> Result<Vec<Item>, ApiClientError> {
        let request = self.client.get(self.url(&format!("/shops/{shop_id}/items")));
        send(request, REQUEST_TIMEOUT).await
    }

    /// Upload a payment proof image.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the API rejects the proof.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload_proof(
        &self,
        target: ProofFor,
        bytes: Vec<u8>,
        filename: &str,
    ) -> Result<ProofReceipt, ApiClientError> {
        let file = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(proof_mime(filename))
            .map_err(|e| ApiClientError::Request(e.to_string()))?;

        let form = match target {
            ProofFor::Order(order_id) => Form::new().text("order_id", order_id.to_string()),
            ProofFor::LatestOf(user_id) => {
                Form::new().text("buyer_user_id", user_id.to_string())
            }
        }
        .part("file", file);

        let request = self
            .client
            .post(self.url("/payments/upload-proof"))
            .multipart(form);
        send(request, UPLOAD_TIMEOUT).await
    }
}

/// Send a request and decode either the success record or the error body.
async fn send<T: DeserializeOwned>(
    request: RequestBuilder,
    timeout: Duration,
) -> Result<T, ApiClientError> {
    let response = request
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| ApiClientError::Request(e.to_string()))?;

    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|e| ApiClientError::Request(e.to_string()))?;

    if status.is_success() {
        debug!(status = status.as_u16(), "Shop API call succeeded");
        return serde_json::from_slice(&bytes).map_err(|e| ApiClientError::Decode(e.to_string()));
    }

    let err = api_error(status, &bytes);
    warn!(error = %err, "Shop API call failed");
    Err(err)
}

fn api_error(status: StatusCode, bytes: &[u8]) -> ApiClientError {
    match serde_json::from_slice::<ErrorBody>(bytes) {
        Ok(body) => ApiClientError::Api {
            status: status.as_u16(),
            code: body.error.code,
            message: body.error.message,
        },
        Err(_) => ApiClientError::Api {
            status: status.as_u16(),
            code: "unknown".to_string(),
            message: String::from_utf8_lossy(bytes).chars().take(200).collect(),
        },
    }
}

/// Image MIME type for a proof file name, `application/octet-stream` if unknown.
fn proof_mime(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("heic") => "image/heic",
        _ => "application/octet-stream",
    }
}
