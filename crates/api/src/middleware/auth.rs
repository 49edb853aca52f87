//! Operator authentication for privileged actions.
//!
//! When `SHOP_OPERATOR_TOKEN` is configured, handlers taking
//! [`RequireOperator`] need `Authorization: Bearer <token>`. Without a
//! configured token the extractor accepts every request.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use secrecy::ExposeSecret;

use crate::error::AppError;
use crate::state::AppState;

/// Extractor guarding operator-only routes.
///
/// # Example
///
/// ```rust,ignore
/// async fn approve(_: RequireOperator, State(state): State<AppState>) -> ... { ... }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RequireOperator;

impl FromRequestParts<AppState> for RequireOperator {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.config().operator_token.as_ref() else {
            return Ok(Self);
        };

        let presented = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim);

        match presented {
            Some(token) if constant_time_eq(token.as_bytes(), expected.expose_secret().as_bytes()) => {
                Ok(Self)
            }
            _ => {
                tracing::warn!(path = %parts.uri.path(), "Rejected operator request");
                Err(AppError::Unauthorized)
            }
        }
    }
}

/// Compare without short-circuiting on the first differing byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"token", b"token"));
        assert!(!constant_time_eq(b"token", b"tokem"));
        assert!(!constant_time_eq(b"token", b"token2"));
        assert!(constant_time_eq(b"", b""));
    }
}
