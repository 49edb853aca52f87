//! HTTP middleware stack for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing span with `request_id` field)
//! 3. Request ID (add unique ID to each request and response)
//! 4. Timeout (30 s per request)
//!
//! Operator authentication is an extractor, applied per route.

pub mod auth;
pub mod request_id;

pub use auth::RequireOperator;
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
