//! Checkout flow: cart review, shipping, payment.
//!
//! The active step is never stored. Every render derives it from the
//! address with [`derive_step`], and [`CheckoutFlow`] decides what that
//! step shows given the transient view state it holds.
//!
//! ```text
//!   Review --continue--> Shipping --valid shipping--> Payment --valid payment--> Payment
//!                                                        |
//!                            no shipping data in memory  v
//!                                                  ShippingRequired
//! ```
//!
//! Shipping data lives only in the flow value. A fresh flow (for example
//! after a reload of `?step=3`) shows [`Screen::ShippingRequired`].

pub mod schema;

use std::fmt;

pub use schema::{
    EXPIRATION_DATE_PATTERN, PaymentData, PaymentForm, ShippingData, ShippingForm,
    ValidationErrors,
};

/// Query parameter carrying the step number.
pub const STEP_PARAM: &str = "step";

/// Path of the checkout page.
pub const CHECKOUT_PATH: &str = "/cart";

/// One of the three linear checkout stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CheckoutStep {
    Review,
    Shipping,
    Payment,
}

impl CheckoutStep {
    /// All steps in order.
    pub const ALL: [Self; 3] = [Self::Review, Self::Shipping, Self::Payment];

    /// Step number as it appears in the address.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Review => 1,
            Self::Shipping => 2,
            Self::Payment => 3,
        }
    }

    /// Title shown in the step indicator.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Review => "Shopping Cart",
            Self::Shipping => "Shipping Method",
            Self::Payment => "Payment Method",
        }
    }

    #[must_use]
    pub const fn from_number(number: i64) -> Option<Self> {
        match number {
            1 => Some(Self::Review),
            2 => Some(Self::Shipping),
            3 => Some(Self::Payment),
            _ => None,
        }
    }

    /// Address of this step's checkout page.
    #[must_use]
    pub fn location(self) -> String {
        format!("{CHECKOUT_PATH}?{STEP_PARAM}={}", self.number())
    }
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Derive the active step from an address query string.
///
/// A missing or empty `step` means [`CheckoutStep::Review`]. Otherwise the
/// value's integer prefix is read (leading whitespace and a sign allowed,
/// trailing characters ignored), so `"2"` and `"2abc"` both select
/// shipping. Anything that is not 1, 2 or 3 gives `None`.
#[must_use]
pub fn derive_step(query: Option<&str>) -> Option<CheckoutStep> {
    let raw = query.and_then(|q| {
        url::form_urlencoded::parse(q.as_bytes())
            .find(|(key, _)| key == STEP_PARAM)
            .map(|(_, value)| value.into_owned())
    });

    match raw.as_deref() {
        None | Some("") => Some(CheckoutStep::Review),
        Some(value) => parse_int_prefix(value).and_then(CheckoutStep::from_number),
    }
}

fn parse_int_prefix(value: &str) -> Option<i64> {
    let trimmed = value.trim_start();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let magnitude = rest.get(..digits_end)?.parse::<i64>().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// What the checkout panel shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Cart lines with removal, plus the continue action.
    Review,
    ShippingForm,
    PaymentForm,
    /// "Please fill in the shipping form to continue".
    ShippingRequired,
}

/// Where the flow sends the shopper next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Navigation {
    pub step: CheckoutStep,
}

impl Navigation {
    #[must_use]
    pub const fn to(step: CheckoutStep) -> Self {
        Self { step }
    }

    /// Address to push.
    #[must_use]
    pub fn location(&self) -> String {
        self.step.location()
    }
}

/// The checkout state machine for one page view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutFlow {
    shipping: Option<ShippingData>,
}

impl CheckoutFlow {
    /// A fresh page view with no shipping data.
    #[must_use]
    pub const fn new() -> Self {
        Self { shipping: None }
    }

    /// Rebuild a page view from shipping fields it was rendered with.
    ///
    /// Fields that no longer validate are dropped, leaving a fresh flow.
    #[must_use]
    pub fn restore(view_state: &ShippingForm) -> Self {
        Self {
            shipping: view_state.validate().ok(),
        }
    }

    /// Shipping data captured in this page view.
    #[must_use]
    pub const fn shipping(&self) -> Option<&ShippingData> {
        self.shipping.as_ref()
    }

    /// Screen for `step` (`None` for an unrecognized step value).
    #[must_use]
    pub const fn screen(&self, step: Option<CheckoutStep>) -> Screen {
        match step {
            Some(CheckoutStep::Review) => Screen::Review,
            Some(CheckoutStep::Shipping) => Screen::ShippingForm,
            Some(CheckoutStep::Payment) if self.shipping.is_some() => Screen::PaymentForm,
            Some(CheckoutStep::Payment) | None => Screen::ShippingRequired,
        }
    }

    /// The review step's "Continue" action.
    #[must_use]
    pub const fn continue_to_shipping(&self) -> Navigation {
        Navigation::to(CheckoutStep::Shipping)
    }

    /// Validate shipping details; on success keep them and move to payment.
    ///
    /// # Errors
    ///
    /// Returns the field errors; the flow is unchanged.
    pub fn submit_shipping(&mut self, form: &ShippingForm) -> Result<Navigation, ValidationErrors> {
        let data = form.validate()?;
        self.shipping = Some(data);
        Ok(Navigation::to(CheckoutStep::Payment))
    }

    /// Validate payment details.
    ///
    /// Nothing is stored or sent anywhere; a valid submission navigates
    /// back to the payment step.
    ///
    /// # Errors
    ///
    /// Returns the field errors.
    pub fn submit_payment(&self, form: &PaymentForm) -> Result<Navigation, ValidationErrors> {
        form.validate()?;
        Ok(Navigation::to(CheckoutStep::Payment))
    }
}
