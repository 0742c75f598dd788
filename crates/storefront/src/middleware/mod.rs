//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with `request_id` field)
//! 3. Request ID (record ID on the span, echo in response)
//! 4. Security headers (CSP, frame options, etc.)
//! 5. Session layer (tower-sessions with `SQLite` store behind [`ResilientStore`])

pub mod request_id;
pub mod security_headers;
pub mod session;

pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
pub use security_headers::security_headers_middleware;
pub use session::{
    ResilientStore, SESSION_COOKIE_NAME, create_session_layer, create_session_store,
    report_write_errors,
};
