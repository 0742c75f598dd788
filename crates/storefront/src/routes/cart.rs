//! Cart and checkout route handlers.
//!
//! The cart is kept in the visitor's session through [`SessionStorage`].
//! Checkout is one page, `/cart?step=N`, whose panel is swapped by HTMX.
//! The step is re-derived from the address on every render and the
//! controller is rebuilt per request. Shipping details only survive as
//! hidden fields of the rendered payment form, so a reload of step 3 asks
//! for the shipping form again.

use amadasun_core::{
    CartLineItem, CartStore, CartSummary, CheckoutFlow, CheckoutStep, Navigation, PaymentForm,
    Price, ProductId, Screen, ShippingForm, ValidationErrors, derive_step,
};
use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{RawQuery, State},
    http::{HeaderMap, HeaderValue},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::routes::{HX_PUSH_URL, HX_TRIGGER, is_htmx};
use crate::state::AppState;
use crate::storage::SessionStorage;

/// Toast shown after a successful add.
pub const ADDED_TO_CART_MESSAGE: &str = "Added to cart successfully!";

/// Client event fired when the cart's contents change.
pub const CART_UPDATED_EVENT: &str = "cart-updated";

/// Open the visitor's cart.
pub async fn open_cart(session: &Session) -> CartStore<SessionStorage> {
    CartStore::open(SessionStorage::new(session.clone())).await
}

/// `HX-Trigger` value firing the `showToast` client event.
fn toast_trigger(message: &str) -> String {
    serde_json::json!({ "showToast": message }).to_string()
}

// =============================================================================
// View Models
// =============================================================================

/// Step indicator entry.
#[derive(Clone)]
pub struct StepView {
    pub number: u8,
    pub title: &'static str,
    pub active: bool,
    pub done: bool,
}

/// Cart line display data for templates.
#[derive(Clone)]
pub struct LineView {
    /// Position in the cart, posted back by the remove button.
    pub index: usize,
    pub product_id: ProductId,
    pub name: String,
    pub image: String,
    pub size: String,
    pub color: String,
    pub quantity: u32,
    pub price: String,
    pub line_total: String,
}

/// Cart details panel.
#[derive(Clone)]
pub struct SummaryView {
    pub subtotal: String,
    pub discount_label: &'static str,
    pub discount: String,
    pub shipping_fee: String,
    pub total: String,
    pub line_count: usize,
}

/// A form input with its current value and validation message.
#[derive(Clone, Default)]
pub struct FieldView {
    pub value: String,
    pub error: Option<&'static str>,
}

impl FieldView {
    fn new(value: &str, errors: Option<&ValidationErrors>, field: &str) -> Self {
        Self {
            value: value.to_string(),
            error: errors.and_then(|e| e.get(field)),
        }
    }
}

/// Shipping form inputs.
#[derive(Clone, Default)]
pub struct ShippingFormView {
    pub name: FieldView,
    pub email: FieldView,
    pub phone: FieldView,
    pub address: FieldView,
    pub city: FieldView,
}

impl ShippingFormView {
    fn new(form: &ShippingForm, errors: Option<&ValidationErrors>) -> Self {
        Self {
            name: FieldView::new(&form.name, errors, "name"),
            email: FieldView::new(&form.email, errors, "email"),
            phone: FieldView::new(&form.phone, errors, "phone"),
            address: FieldView::new(&form.address, errors, "address"),
            city: FieldView::new(&form.city, errors, "city"),
        }
    }
}

/// Payment form inputs.
#[derive(Clone, Default)]
pub struct PaymentFormView {
    pub card_holder: FieldView,
    pub card_number: FieldView,
    pub expiration_date: FieldView,
    pub cvv: FieldView,
}

impl PaymentFormView {
    fn new(form: &PaymentForm, errors: Option<&ValidationErrors>) -> Self {
        Self {
            card_holder: FieldView::new(&form.card_holder, errors, "cardHolder"),
            card_number: FieldView::new(&form.card_number, errors, "cardNumber"),
            expiration_date: FieldView::new(&form.expiration_date, errors, "expirationDate"),
            cvv: FieldView::new(&form.cvv, errors, "cvv"),
        }
    }
}

/// Everything the checkout panel renders.
#[derive(Clone)]
pub struct CheckoutView {
    pub steps: Vec<StepView>,
    pub screen: Screen,
    pub lines: Vec<LineView>,
    pub summary: SummaryView,
    pub shipping: ShippingFormView,
    pub payment: PaymentFormView,
    /// Shipping details carried by the payment form as hidden fields.
    pub view_state: ShippingForm,
}

impl CheckoutView {
    fn new(
        state: &AppState,
        cart: &CartStore<SessionStorage>,
        flow: &CheckoutFlow,
        step: Option<CheckoutStep>,
    ) -> Self {
        let steps = CheckoutStep::ALL
            .iter()
            .map(|&s| StepView {
                number: s.number(),
                title: s.title(),
                active: step == Some(s),
                done: step.is_some_and(|current| s < current),
            })
            .collect();

        let lines = cart
            .items()
            .iter()
            .enumerate()
            .map(|(index, item)| LineView {
                index,
                product_id: item.id(),
                name: item.product.name.clone(),
                image: item.image().unwrap_or_default().to_string(),
                size: item.selected_size.clone(),
                color: item.selected_color.clone(),
                quantity: item.quantity,
                price: state.format_price(item.product.price),
                line_total: state.format_price(item.line_total()),
            })
            .collect();

        Self {
            steps,
            screen: flow.screen(step),
            lines,
            summary: summary_view(state, &cart.summary()),
            shipping: ShippingFormView::default(),
            payment: PaymentFormView::default(),
            view_state: flow.shipping().map(ShippingForm::from).unwrap_or_default(),
        }
    }

    #[must_use]
    pub fn is_review(&self) -> bool {
        self.screen == Screen::Review
    }

    #[must_use]
    pub fn is_shipping_form(&self) -> bool {
        self.screen == Screen::ShippingForm
    }

    #[must_use]
    pub fn is_payment_form(&self) -> bool {
        self.screen == Screen::PaymentForm
    }

    #[must_use]
    pub fn is_shipping_required(&self) -> bool {
        self.screen == Screen::ShippingRequired
    }
}

fn summary_view(state: &AppState, summary: &CartSummary) -> SummaryView {
    let placeholder = |amount: Decimal| Price::new(amount, state.currency()).display_short();
    SummaryView {
        subtotal: state.format_price(summary.subtotal),
        discount_label: CartSummary::DISCOUNT_LABEL,
        discount: placeholder(summary.discount),
        shipping_fee: placeholder(summary.shipping_fee),
        total: state.format_price(summary.total),
        line_count: summary.line_count,
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub panel: CheckoutView,
    pub cart_count: usize,
}

/// Checkout panel fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/checkout.html")]
pub struct CheckoutPanelTemplate {
    pub panel: CheckoutView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: usize,
}

/// Render the checkout panel: a fragment for HTMX, the full page otherwise.
///
/// `navigation` becomes `HX-Push-Url` so the address bar tracks the step.
fn render_checkout(
    headers: &HeaderMap,
    panel: CheckoutView,
    cart_count: usize,
    navigation: Option<Navigation>,
) -> Response {
    if !is_htmx(headers) {
        return CartShowTemplate { panel, cart_count }.into_response();
    }

    let mut response = CheckoutPanelTemplate { panel }.into_response();
    if let Some(location) = navigation.and_then(|nav| HeaderValue::from_str(&nav.location()).ok())
    {
        response.headers_mut().insert(HX_PUSH_URL, location);
    }
    response
}

// =============================================================================
// Forms
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    pub size: String,
    pub color: String,
}

const fn default_quantity() -> u32 {
    1
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    /// Index of the line whose product is removed.
    pub line: usize,
}

/// Payment form together with the shipping details the panel carried.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PaymentSubmission {
    #[serde(flatten)]
    pub shipping: ShippingForm,
    #[serde(flatten)]
    pub payment: PaymentForm,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the checkout page for the step in the address.
#[instrument(skip(state, session, headers))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    let step = derive_step(query.as_deref());
    let cart = open_cart(&session).await;
    let flow = CheckoutFlow::new();

    let panel = CheckoutView::new(&state, &cart, &flow, step);
    render_checkout(&headers, panel, cart.len(), None)
}

/// Get cart count badge (HTMX).
#[instrument(skip(session))]
pub async fn count(session: Session) -> impl IntoResponse {
    CartCountTemplate {
        count: open_cart(&session).await.len(),
    }
}

/// Add a configured product to the cart.
///
/// HTMX requests get the updated count badge and a `showToast` trigger;
/// plain form posts are redirected to the cart.
#[instrument(skip(state, session, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let product = state
        .catalog()
        .get(form.product_id)
        .ok_or_else(|| AppError::NotFound(format!("product {}", form.product_id)))?;
    let item = CartLineItem::configure(product, form.quantity, &form.size, &form.color)?;

    let mut cart = open_cart(&session).await;
    cart.add_to_cart(item).await;

    let product_id = form.product_id.to_string();
    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product_id", product_id.as_str())]),
    );
    tracing::info!(
        product_id = %form.product_id,
        quantity = form.quantity,
        lines = cart.len(),
        "Added to cart"
    );

    if !is_htmx(&headers) {
        return Ok(Redirect::to(&CheckoutStep::Review.location()).into_response());
    }

    Ok((
        AppendHeaders([(HX_TRIGGER, toast_trigger(ADDED_TO_CART_MESSAGE))]),
        CartCountTemplate { count: cart.len() },
    )
        .into_response())
}

/// Leave the review step for the shipping form.
#[instrument(skip(state, session, headers))]
pub async fn continue_to_shipping(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
) -> Response {
    let flow = CheckoutFlow::new();
    let navigation = flow.continue_to_shipping();

    if !is_htmx(&headers) {
        return Redirect::to(&navigation.location()).into_response();
    }

    let cart = open_cart(&session).await;
    let panel = CheckoutView::new(&state, &cart, &flow, Some(navigation.step));
    render_checkout(&headers, panel, cart.len(), Some(navigation))
}

/// Remove every line of the posted line's product.
#[instrument(skip(state, session, headers))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let mut cart = open_cart(&session).await;
    let item = cart
        .items()
        .get(form.line)
        .cloned()
        .ok_or_else(|| AppError::BadRequest(format!("no cart line {}", form.line)))?;

    cart.remove_from_cart(&item).await;
    tracing::info!(product_id = %item.id(), lines = cart.len(), "Removed from cart");

    Ok(review_after_change(&state, &headers, &cart))
}

/// Empty the cart.
#[instrument(skip(state, session, headers))]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
) -> Response {
    let mut cart = open_cart(&session).await;
    cart.clear_cart().await;
    tracing::info!("Cleared cart");

    review_after_change(&state, &headers, &cart)
}

fn review_after_change(
    state: &AppState,
    headers: &HeaderMap,
    cart: &CartStore<SessionStorage>,
) -> Response {
    if !is_htmx(headers) {
        return Redirect::to(&CheckoutStep::Review.location()).into_response();
    }

    let step = CheckoutStep::Review;
    let panel = CheckoutView::new(state, cart, &CheckoutFlow::new(), Some(step));
    (
        AppendHeaders([(HX_TRIGGER, CART_UPDATED_EVENT)]),
        render_checkout(headers, panel, cart.len(), Some(Navigation::to(step))),
    )
        .into_response()
}

/// Validate shipping details and move on to payment.
///
/// Invalid input re-renders the shipping form with a message per field.
#[instrument(skip_all)]
pub async fn shipping(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<ShippingForm>,
) -> Response {
    let cart = open_cart(&session).await;
    let mut flow = CheckoutFlow::new();

    match flow.submit_shipping(&form) {
        Ok(navigation) => {
            tracing::debug!("Shipping details accepted");
            let panel = CheckoutView::new(&state, &cart, &flow, Some(navigation.step));
            render_checkout(&headers, panel, cart.len(), Some(navigation))
        }
        Err(errors) => {
            tracing::debug!(invalid_fields = errors.len(), "Shipping details rejected");
            let mut panel = CheckoutView::new(&state, &cart, &flow, Some(CheckoutStep::Shipping));
            panel.shipping = ShippingFormView::new(&form, Some(&errors));
            render_checkout(&headers, panel, cart.len(), None)
        }
    }
}

/// Validate payment details.
///
/// The flow is rebuilt from the shipping fields the payment form carried.
/// Without them the panel asks for the shipping form instead.
#[instrument(skip_all)]
pub async fn payment(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(submission): Form<PaymentSubmission>,
) -> Response {
    let cart = open_cart(&session).await;
    let flow = CheckoutFlow::restore(&submission.shipping);
    let step = CheckoutStep::Payment;
    let mut panel = CheckoutView::new(&state, &cart, &flow, Some(step));

    if !panel.is_payment_form() {
        tracing::debug!("Payment submitted without shipping details");
        return render_checkout(&headers, panel, cart.len(), Some(Navigation::to(step)));
    }

    match flow.submit_payment(&submission.payment) {
        Ok(navigation) => {
            tracing::info!(lines = cart.len(), "Payment details accepted");
            panel.payment = PaymentFormView::new(&submission.payment, None);
            render_checkout(&headers, panel, cart.len(), Some(navigation))
        }
        Err(errors) => {
            tracing::debug!(invalid_fields = errors.len(), "Payment details rejected");
            panel.payment = PaymentFormView::new(&submission.payment, Some(&errors));
            render_checkout(&headers, panel, cart.len(), None)
        }
    }
}
