//! Order and payment route handlers.

use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
};

use slh_shop_core::models::{CreateOrder, Order, OrderWithPayment, ProofReceipt};
use slh_shop_core::{OrderId, UserId};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireOperator;
use crate::services::ProofRequest;
use crate::state::AppState;

/// Create a pending order and return where to pay.
pub async fn create(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateOrder>,
) -> Result<(StatusCode, Json<OrderWithPayment>)> {
    let created = state.orders().create(&request).await?;
    add_breadcrumb(
        "order",
        "Order created",
        &[("order_id", created.order.id.to_string())],
    );
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<Order>> {
    Ok(Json(state.orders().order(id).await?))
}

/// Accept a payment proof as `multipart/form-data`.
///
/// Fields: `file` (required), `order_id` or, as a fallback, `buyer_user_id`.
pub async fn upload_proof(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<ProofReceipt>> {
    let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let mut target = ProofRequest::default();
    let mut file: Option<(Vec<u8>, Option<String>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("order_id") => {
                let text = field_text(field).await?;
                target.order_id = parse_optional_id::<OrderId>("order_id", &text)?;
            }
            Some("buyer_user_id") => {
                let text = field_text(field).await?;
                target.buyer_user_id = parse_optional_id::<UserId>("buyer_user_id", &text)?;
            }
            Some("file") => {
                let filename = field.file_name().map(String::from);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                file = Some((bytes.to_vec(), filename));
            }
            _ => {}
        }
    }

    let (bytes, filename) = file.unwrap_or_default();
    let receipt = state
        .orders()
        .submit_proof(target, &bytes, filename.as_deref())
        .await?;
    Ok(Json(receipt))
}

/// Mark an order as paid. Requires the operator token when one is configured.
pub async fn approve(
    _operator: RequireOperator,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<Order>> {
    Ok(Json(state.orders().approve(id).await?))
}

async fn field_text(field: axum::extract::multipart::Field<'_>) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

/// Blank means "not supplied"; anything else must be a UUID.
fn parse_optional_id<T>(name: &str, value: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
{
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| AppError::BadRequest(format!("{name} is not a valid id")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_optional_id() {
        assert!(parse_optional_id::<OrderId>("order_id", "  ").unwrap().is_none());
        let id = OrderId::generate();
        assert_eq!(
            parse_optional_id::<OrderId>("order_id", &id.to_string()).unwrap(),
            Some(id)
        );
        assert!(parse_optional_id::<OrderId>("order_id", "42").is_err());
    }
}
