//! Shopping cart: line items, the persisted cart store and its summary.
//!
//! [`CartStore`] is the single source of truth for a visitor's cart. It is
//! an explicit value handed to whoever needs it, not a global, and it
//! writes the whole cart to [`ClientStorage`] after every mutation.
//!
//! # Storage failures
//!
//! The store never surfaces storage errors to its caller. A failed read
//! opens an empty cart, a failed write keeps the in-memory cart, and in
//! both cases the store stops writing for the rest of its life.

pub mod storage;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Product;
use crate::types::ProductId;

pub use storage::{ClientStorage, MemoryStorage, StorageError};

/// Fixed storage key holding the serialized cart.
pub const CART_STORAGE_KEY: &str = "cart-storage";

/// Version written into the persisted envelope.
const CART_STORAGE_VERSION: u32 = 0;

/// Errors from configuring a line item against its product.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LineItemError {
    #[error("quantity must be at least 1")]
    ZeroQuantity,
    #[error("size '{0}' is not offered for this product")]
    UnknownSize(String),
    #[error("color '{0}' is not offered for this product")]
    UnknownColor(String),
}

/// A product configured with quantity, size and color.
///
/// Serializes as the product's own fields plus `quantity`, `selectedSize`
/// and `selectedColor`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    #[serde(flatten)]
    pub product: Product,
    pub quantity: u32,
    pub selected_size: String,
    pub selected_color: String,
}

impl CartLineItem {
    /// Configure a line item, checking the options against the product.
    ///
    /// The cart store accepts any line item; this is the check callers run
    /// before handing one over.
    ///
    /// # Errors
    ///
    /// Returns [`LineItemError`] for a zero quantity or an option the
    /// product does not offer.
    pub fn configure(
        product: &Product,
        quantity: u32,
        size: &str,
        color: &str,
    ) -> Result<Self, LineItemError> {
        if quantity == 0 {
            return Err(LineItemError::ZeroQuantity);
        }
        if !product.has_size(size) {
            return Err(LineItemError::UnknownSize(size.to_string()));
        }
        if !product.has_color(color) {
            return Err(LineItemError::UnknownColor(color.to_string()));
        }
        Ok(Self {
            product: product.clone(),
            quantity,
            selected_size: size.to_string(),
            selected_color: color.to_string(),
        })
    }

    #[must_use]
    pub const fn id(&self) -> ProductId {
        self.product.id
    }

    /// Price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.price * Decimal::from(self.quantity)
    }

    /// Image for the selected color.
    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.product.image_for(&self.selected_color)
    }
}

/// Totals shown in the cart details panel.
///
/// Discount and shipping fee are fixed display placeholders; they are not
/// applied, so `total == subtotal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartSummary {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping_fee: Decimal,
    pub total: Decimal,
    /// Number of lines in the cart.
    pub line_count: usize,
}

impl CartSummary {
    /// Percentage label shown (struck through) next to the discount.
    pub const DISCOUNT_LABEL: &'static str = "10%";

    /// Summarize a sequence of line items.
    #[must_use]
    pub fn of(items: &[CartLineItem]) -> Self {
        let subtotal: Decimal = items.iter().map(CartLineItem::line_total).sum();
        Self {
            subtotal,
            discount: Decimal::TEN,
            shipping_fee: Decimal::TEN,
            total: subtotal,
            line_count: items.len(),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct PersistedCart<T> {
    state: PersistedState<T>,
    version: u32,
}

#[derive(Serialize, Deserialize)]
struct PersistedState<T> {
    cart: T,
}

/// The visitor's cart, kept in sync with client storage.
#[derive(Debug)]
pub struct CartStore<S> {
    storage: S,
    items: Vec<CartLineItem>,
    persistent: bool,
}

impl<S: ClientStorage> CartStore<S> {
    /// Open the cart saved in `storage`.
    ///
    /// A missing or unreadable record yields an empty cart. If the storage
    /// itself fails, the cart is empty and stays in memory only.
    pub async fn open(storage: S) -> Self {
        let (items, persistent) = match storage.read(CART_STORAGE_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<PersistedCart<Vec<CartLineItem>>>(&raw)
            {
                Ok(persisted) => (persisted.state.cart, true),
                Err(e) => {
                    tracing::warn!(error = %e, "Discarding unreadable saved cart");
                    (Vec::new(), true)
                }
            },
            Ok(None) => (Vec::new(), true),
            Err(e) => {
                tracing::warn!(error = %e, "Cart storage unavailable, keeping cart in memory");
                (Vec::new(), false)
            }
        };

        Self {
            storage,
            items,
            persistent,
        }
    }

    /// Append a line item. No validation, no merging with equal lines.
    pub async fn add_to_cart(&mut self, item: CartLineItem) {
        tracing::debug!(product_id = %item.id(), quantity = item.quantity, "Adding to cart");
        self.items.push(item);
        self.persist().await;
    }

    /// Remove every line with the same product id as `item`.
    ///
    /// Size and color are ignored, so all configurations of the product go.
    pub async fn remove_from_cart(&mut self, item: &CartLineItem) {
        let id = item.id();
        let before = self.items.len();
        self.items.retain(|line| line.id() != id);
        tracing::debug!(
            product_id = %id,
            removed = before - self.items.len(),
            "Removed from cart"
        );
        self.persist().await;
    }

    /// Empty the cart.
    pub async fn clear_cart(&mut self) {
        self.items.clear();
        self.persist().await;
    }

    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn summary(&self) -> CartSummary {
        CartSummary::of(&self.items)
    }

    /// Whether mutations are still being written to storage.
    #[must_use]
    pub const fn is_persistent(&self) -> bool {
        self.persistent
    }

    /// Give back the storage handle.
    pub fn into_storage(self) -> S {
        self.storage
    }

    async fn persist(&mut self) {
        if !self.persistent {
            return;
        }

        let envelope = PersistedCart {
            state: PersistedState {
                cart: self.items.as_slice(),
            },
            version: CART_STORAGE_VERSION,
        };
        let raw = match serde_json::to_string(&envelope) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize cart, keeping cart in memory");
                self.persistent = false;
                return;
            }
        };

        if let Err(e) = self.storage.write(CART_STORAGE_KEY, raw).await {
            tracing::warn!(error = %e, "Failed to save cart, keeping cart in memory");
            self.persistent = false;
        }
    }
}
