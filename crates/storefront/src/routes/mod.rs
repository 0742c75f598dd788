//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Product listing
//!
//! # Products
//! GET  /products/:id           - Product detail (?size=&color= select options)
//!
//! # Cart and checkout (HTMX fragments)
//! GET  /cart                   - Checkout page (?step=1|2|3)
//! GET  /cart/count             - Cart count badge (fragment)
//! POST /cart/add               - Add to cart (returns count badge, triggers showToast)
//! POST /cart/continue          - Review -> shipping
//! POST /cart/remove            - Remove every line of a product
//! POST /cart/clear             - Empty the cart
//! POST /cart/shipping          - Validate shipping, show payment panel
//! POST /cart/payment           - Validate payment
//! ```

pub mod cart;
pub mod home;
pub mod products;

use axum::{
    Router,
    http::HeaderMap,
    routing::{get, post},
};

use crate::state::AppState;

/// Request header HTMX sets on every request it issues.
pub const HX_REQUEST: &str = "hx-request";

/// Response header asking HTMX to fire client-side events.
pub const HX_TRIGGER: &str = "hx-trigger";

/// Response header asking HTMX to push a new address into history.
pub const HX_PUSH_URL: &str = "hx-push-url";

/// Whether the request came from HTMX (and expects a fragment).
#[must_use]
pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get(HX_REQUEST)
        .is_some_and(|value| value.as_bytes() == b"true")
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new().route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
        .route("/add", post(cart::add))
        .route("/continue", post(cart::continue_to_shipping))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/shipping", post(cart::shipping))
        .route("/payment", post(cart::payment))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Product listing
        .route("/", get(home::home))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_is_htmx() {
        let mut headers = HeaderMap::new();
        assert!(!is_htmx(&headers));

        headers.insert(HX_REQUEST, HeaderValue::from_static("true"));
        assert!(is_htmx(&headers));

        headers.insert(HX_REQUEST, HeaderValue::from_static("false"));
        assert!(!is_htmx(&headers));
    }
}
