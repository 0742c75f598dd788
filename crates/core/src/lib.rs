//! Amadasun Core - storefront domain library.
//!
//! This crate holds everything the storefront needs to reason about a
//! shopper's cart and checkout, independent of HTTP or templates:
//!
//! - [`types`] - Newtype wrappers for product IDs, prices and emails
//! - [`catalog`] - Immutable product reference data
//! - [`cart`] - Cart line items and the persisted [`CartStore`]
//! - [`checkout`] - Step derivation, the checkout flow controller and
//!   the shipping/payment validation schemas
//!
//! # Architecture
//!
//! The core crate performs no I/O of its own. Durable storage is reached
//! through the [`ClientStorage`] trait, which the storefront implements on
//! top of its session store and tests implement with [`MemoryStorage`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod types;

pub use cart::{
    CART_STORAGE_KEY, CartLineItem, CartStore, CartSummary, ClientStorage, LineItemError,
    MemoryStorage, StorageError,
};
pub use catalog::{Catalog, CatalogError, Product};
pub use checkout::{
    CheckoutFlow, CheckoutStep, Navigation, PaymentData, PaymentForm, Screen, ShippingData,
    ShippingForm, ValidationErrors, derive_step,
};
pub use types::*;
