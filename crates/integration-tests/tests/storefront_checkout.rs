//! Integration tests for the storefront cart and checkout.
//!
//! Each test drives the full router (sessions, middleware, templates)
//! in-process against an in-memory session database.
//!
//! Run with: cargo test -p amadasun-integration-tests

use amadasun_integration_tests::TestApp;
use axum::http::StatusCode;
use serde_json::Value;

const SHIPPING_REQUIRED: &str = "Please fill in the shipping form to continue";

const VALID_SHIPPING: &str =
    "name=Ada+Obi&email=ada%40example.com&phone=08000000000&address=1+Marina+Rd&city=Lagos";

/// Add a line for `product_id` through the HTMX add-to-cart form.
async fn add(app: &mut TestApp, product_id: u32, quantity: u32, size: &str, color: &str) {
    let form = format!("product_id={product_id}&quantity={quantity}&size={size}&color={color}");
    let resp = app.post("/cart/add", &form, true).await;
    assert_eq!(resp.status, StatusCode::OK, "add failed: {}", resp.body);
}

// ============================================================================
// Health & Middleware
// ============================================================================

#[tokio::test]
async fn test_health_endpoints() {
    let mut app = TestApp::new().await;

    let resp = app.get("/health", false).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, "ok");

    let resp = app.get("/health/ready", false).await;
    assert_eq!(resp.status, StatusCode::OK);
}

#[tokio::test]
async fn test_responses_carry_security_headers_and_request_id() {
    let mut app = TestApp::new().await;

    let resp = app.get("/", false).await;
    assert_eq!(resp.header("x-frame-options"), Some("DENY"));
    assert_eq!(resp.header("x-content-type-options"), Some("nosniff"));
    assert!(resp.header("content-security-policy").is_some());
    assert!(resp.header("x-request-id").is_some_and(|id| !id.is_empty()));
}

#[tokio::test]
async fn test_pages_are_not_cached_but_static_assets_may_be() {
    let mut app = TestApp::new().await;

    let resp = app.get("/cart", false).await;
    assert_eq!(resp.header("cache-control"), Some("no-store"));

    let resp = app.get("/static/css/main.css", false).await;
    assert_ne!(resp.header("cache-control"), Some("no-store"));
    assert_eq!(resp.header("x-content-type-options"), Some("nosniff"));
}

// ============================================================================
// Catalog
// ============================================================================

#[tokio::test]
async fn test_home_lists_products_with_options() {
    let mut app = TestApp::new().await;

    let resp = app.get("/", false).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("Adidas CoreFit T-Shirt"));
    assert!(resp.body.contains("Puma Ultra Warm Zip"));
    assert!(resp.body.contains("$39.90"));
    assert!(resp.body.contains(r#"name="size""#));
    assert!(resp.body.contains(r#"name="color""#));
}

#[tokio::test]
async fn test_product_page_reads_options_from_address() {
    let mut app = TestApp::new().await;

    let resp = app.get("/products/1?size=m&color=purple", false).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("1p.png"));
    assert!(resp.body.contains(r#"name="size" value="m""#));
    assert!(resp.body.contains(r#"name="color" value="purple""#));
    assert!(resp.body.contains(r#"name="quantity""#));
}

#[tokio::test]
async fn test_product_page_falls_back_to_first_options() {
    let mut app = TestApp::new().await;

    let resp = app.get("/products/1?size=huge&color=plaid", false).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains(r#"name="size" value="s""#));
    assert!(resp.body.contains(r#"name="color" value="gray""#));
}

#[tokio::test]
async fn test_unknown_product_page_is_not_found() {
    let mut app = TestApp::new().await;

    assert_eq!(
        app.get("/products/999", false).await.status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        app.get("/products/tee", false).await.status,
        StatusCode::NOT_FOUND
    );
}

// ============================================================================
// Cart
// ============================================================================

#[tokio::test]
async fn test_add_to_cart_returns_badge_and_toast() {
    let mut app = TestApp::new().await;

    let resp = app
        .post("/cart/add", "product_id=1&size=m&color=gray", true)
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains(r#"id="cart-count""#));
    assert!(resp.body.contains(">1</span>"));

    let trigger: Value = serde_json::from_str(resp.header("hx-trigger").unwrap_or("{}"))
        .unwrap_or(Value::Null);
    assert_eq!(trigger["showToast"], "Added to cart successfully!");
}

#[tokio::test]
async fn test_add_to_cart_without_htmx_redirects_to_cart() {
    let mut app = TestApp::new().await;

    let resp = app
        .post("/cart/add", "product_id=2&quantity=2&size=l&color=green", false)
        .await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(resp.header("location"), Some("/cart?step=1"));

    let resp = app.get("/cart/count", true).await;
    assert!(resp.body.contains(">1</span>"));
}

#[tokio::test]
async fn test_add_rejects_unknown_product_and_options() {
    let mut app = TestApp::new().await;

    let resp = app
        .post("/cart/add", "product_id=999&size=m&color=gray", true)
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    let resp = app
        .post("/cart/add", "product_id=2&size=xxl&color=gray", true)
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = app
        .post("/cart/add", "product_id=2&size=m&color=purple", true)
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = app
        .post("/cart/add", "product_id=2&quantity=0&size=m&color=gray", true)
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = app.get("/cart/count", true).await;
    assert!(resp.body.contains(">0</span>"));
}

#[tokio::test]
async fn test_cart_persists_across_requests_in_session() {
    let mut app = TestApp::new().await;
    add(&mut app, 1, 1, "m", "gray").await;
    add(&mut app, 2, 2, "l", "green").await;

    let resp = app.get("/cart", false).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("<!DOCTYPE html>"));
    assert!(resp.body.contains("Adidas CoreFit T-Shirt"));
    assert!(resp.body.contains("Puma Ultra Warm Zip"));
    // 39.90 + 59.90 * 2; total equals subtotal
    assert_eq!(resp.body.matches("$159.70").count(), 2);
    // Display-only placeholders
    assert!(resp.body.contains("<s>10%</s> $10"));

    // A different visitor has their own, empty cart
    app.clear_cookie();
    let resp = app.get("/cart/count", true).await;
    assert!(resp.body.contains(">0</span>"));
}

#[tokio::test]
async fn test_same_product_adds_separate_lines() {
    let mut app = TestApp::new().await;
    add(&mut app, 1, 1, "m", "gray").await;
    add(&mut app, 1, 1, "m", "gray").await;
    add(&mut app, 1, 3, "xl", "green").await;

    let resp = app.get("/cart/count", true).await;
    assert!(resp.body.contains(">3</span>"));
}

#[tokio::test]
async fn test_remove_drops_every_line_of_the_product() {
    let mut app = TestApp::new().await;
    add(&mut app, 1, 1, "m", "gray").await;
    add(&mut app, 2, 1, "s", "green").await;
    add(&mut app, 1, 2, "l", "purple").await;

    let resp = app.post("/cart/remove", "line=2", true).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.header("hx-trigger"), Some("cart-updated"));
    assert_eq!(resp.header("hx-push-url"), Some("/cart?step=1"));
    assert!(!resp.body.contains("Adidas CoreFit T-Shirt"));
    assert!(resp.body.contains("Puma Ultra Warm Zip"));

    let resp = app.get("/cart/count", true).await;
    assert!(resp.body.contains(">1</span>"));
}

#[tokio::test]
async fn test_remove_stale_line_is_bad_request() {
    let mut app = TestApp::new().await;
    add(&mut app, 1, 1, "m", "gray").await;

    let resp = app.post("/cart/remove", "line=5", true).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_clear_empties_cart() {
    let mut app = TestApp::new().await;
    add(&mut app, 1, 1, "m", "gray").await;
    add(&mut app, 2, 1, "s", "green").await;

    let resp = app.post("/cart/clear", "", true).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("Your cart is empty"));

    // Clearing an empty cart is harmless
    let resp = app.post("/cart/clear", "", false).await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);

    let resp = app.get("/cart/count", true).await;
    assert!(resp.body.contains(">0</span>"));
}

#[tokio::test]
async fn test_add_to_cart_survives_session_database_failure() {
    let mut app = TestApp::new().await;
    app.break_session_database().await;

    let resp = app
        .post("/cart/add", "product_id=1&size=m&color=gray", true)
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains(">1</span>"));
    let trigger: Value = serde_json::from_str(resp.header("hx-trigger").unwrap_or("{}"))
        .unwrap_or(Value::Null);
    assert_eq!(trigger["showToast"], "Added to cart successfully!");

    // Browsers without HTMX still get their redirect
    let resp = app
        .post("/cart/add", "product_id=2&size=l&color=green", false)
        .await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);

    let resp = app.get("/cart", false).await;
    assert_eq!(resp.status, StatusCode::OK);
}

// ============================================================================
// Checkout Steps
// ============================================================================

#[tokio::test]
async fn test_step_is_derived_from_address() {
    let mut app = TestApp::new().await;

    let review = app.get("/cart", true).await;
    assert!(review.body.contains(r#"action="/cart/continue""#));

    let review = app.get("/cart?step=1", true).await;
    assert!(review.body.contains(r#"action="/cart/continue""#));

    let shipping = app.get("/cart?step=2", true).await;
    assert!(shipping.body.contains(r#"action="/cart/shipping""#));

    let shipping = app.get("/cart?step=2abc", true).await;
    assert!(shipping.body.contains(r#"action="/cart/shipping""#));

    for step in ["3", "0", "7", "abc", "-1"] {
        let resp = app.get(&format!("/cart?step={step}"), true).await;
        assert!(resp.body.contains(SHIPPING_REQUIRED), "step={step}");
        assert!(!resp.body.contains(r#"name="cardNumber""#), "step={step}");
    }
}

#[tokio::test]
async fn test_htmx_gets_fragment_and_browser_gets_page() {
    let mut app = TestApp::new().await;

    let fragment = app.get("/cart?step=2", true).await;
    assert!(fragment.body.contains(r#"id="checkout""#));
    assert!(!fragment.body.contains("<!DOCTYPE html>"));

    let page = app.get("/cart?step=2", false).await;
    assert!(page.body.contains(r#"id="checkout""#));
    assert!(page.body.contains("<!DOCTYPE html>"));
}

#[tokio::test]
async fn test_continue_moves_to_shipping() {
    let mut app = TestApp::new().await;
    add(&mut app, 1, 1, "m", "gray").await;

    let resp = app.post("/cart/continue", "", false).await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(resp.header("location"), Some("/cart?step=2"));

    let resp = app.post("/cart/continue", "", true).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.header("hx-push-url"), Some("/cart?step=2"));
    assert!(resp.body.contains(r#"action="/cart/shipping""#));
}

#[tokio::test]
async fn test_valid_shipping_shows_payment_form() {
    let mut app = TestApp::new().await;
    add(&mut app, 1, 1, "m", "gray").await;

    let resp = app.post("/cart/shipping", VALID_SHIPPING, true).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.header("hx-push-url"), Some("/cart?step=3"));
    assert!(resp.body.contains(r#"name="cardNumber""#));
    assert!(
        resp.body
            .contains(r#"type="hidden" name="email" value="ada@example.com""#)
    );
    assert!(!resp.body.contains(SHIPPING_REQUIRED));
}

#[tokio::test]
async fn test_reload_of_payment_step_asks_for_shipping_again() {
    let mut app = TestApp::new().await;
    add(&mut app, 1, 1, "m", "gray").await;

    let resp = app.post("/cart/shipping", VALID_SHIPPING, true).await;
    assert!(resp.body.contains(r#"name="cardNumber""#));

    // The shipping details were never stored; a fresh load has none
    let resp = app.get("/cart?step=3", false).await;
    assert!(resp.body.contains(SHIPPING_REQUIRED));
    assert!(!resp.body.contains(r#"name="cardNumber""#));
}

#[tokio::test]
async fn test_invalid_shipping_shows_field_errors() {
    let mut app = TestApp::new().await;

    let resp = app
        .post(
            "/cart/shipping",
            "name=&email=nope&phone=123&address=1+Marina+Rd&city=Lagos",
            true,
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.header("hx-push-url").is_none());
    assert!(resp.body.contains("Name is required!"));
    assert!(resp.body.contains("Invalid email address"));
    assert!(resp.body.contains("A valid phone number is required!"));
    assert!(!resp.body.contains("City is required!"));
    // Entered values are kept
    assert!(resp.body.contains(r#"value="1 Marina Rd""#));
    assert!(!resp.body.contains(r#"name="cardNumber""#));
}

#[tokio::test]
async fn test_shipping_phone_must_be_digits() {
    let mut app = TestApp::new().await;

    let resp = app
        .post(
            "/cart/shipping",
            "name=Ada&email=ada%40example.com&phone=0800abc0000&address=1+Marina+Rd&city=Lagos",
            true,
        )
        .await;
    assert!(resp.body.contains("Phone number must contain digits only!"));
}

#[tokio::test]
async fn test_payment_without_shipping_asks_for_shipping() {
    let mut app = TestApp::new().await;

    let resp = app
        .post(
            "/cart/payment",
            "cardHolder=Ada&cardNumber=4242424242424242&expirationDate=05+%2F27&cvv=123",
            true,
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains(SHIPPING_REQUIRED));
    assert!(!resp.body.contains(r#"name="cardNumber""#));
}

#[tokio::test]
async fn test_valid_payment_stays_on_payment_step() {
    let mut app = TestApp::new().await;
    add(&mut app, 2, 1, "s", "gray").await;

    let form = format!(
        "{VALID_SHIPPING}&cardHolder=Ada+Obi&cardNumber=4242424242424242&expirationDate=05+%2F27&cvv=123"
    );
    let resp = app.post("/cart/payment", &form, true).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.header("hx-push-url"), Some("/cart?step=3"));
    assert!(resp.body.contains(r#"name="cardNumber""#));
    assert!(!resp.body.contains("field__error"));

    // Nothing about the order touched the cart
    let resp = app.get("/cart/count", true).await;
    assert!(resp.body.contains(">1</span>"));
}

#[tokio::test]
async fn test_invalid_payment_shows_field_errors() {
    let mut app = TestApp::new().await;

    // `05/27` fails the expiration pattern as written (stray spaces)
    let form = format!(
        "{VALID_SHIPPING}&cardHolder=Ada+Obi&cardNumber=4242&expirationDate=05%2F27&cvv=12"
    );
    let resp = app.post("/cart/payment", &form, true).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.header("hx-push-url").is_none());
    assert!(resp.body.contains("A valid card number is required!"));
    assert!(resp.body.contains("Expiration date must be in MM"));
    assert!(resp.body.contains("CVV is required!"));
    // Shipping details are carried forward for the next attempt
    assert!(resp.body.contains(r#"type="hidden" name="city" value="Lagos""#));
}
