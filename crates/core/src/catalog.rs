//! Product catalog reference data.
//!
//! Products are created outside the cart and checkout code (the storefront
//! loads them from a JSON file at startup) and are never mutated afterwards.
//! [`Product::validate`] enforces the invariants every other module relies
//! on: a non-negative price, non-empty size and color lists, and an image
//! for every color.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::ProductId;

/// Errors raised when product reference data breaks an invariant.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("product {0} has a negative price")]
    NegativePrice(ProductId),
    #[error("product {0} has no sizes")]
    NoSizes(ProductId),
    #[error("product {0} has no colors")]
    NoColors(ProductId),
    #[error("product {id} has no image for color '{color}'")]
    MissingImage { id: ProductId, color: String },
    #[error("product id {0} appears more than once")]
    DuplicateId(ProductId),
    #[error("catalog JSON is invalid: {0}")]
    Parse(String),
}

/// A product as shown in the catalog.
///
/// Field names serialize in camelCase so a persisted cart line carries the
/// same shape the product has everywhere else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub short_description: String,
    pub description: String,
    pub price: Decimal,
    /// Available sizes in display order.
    pub sizes: Vec<String>,
    /// Available colors in display order.
    pub colors: Vec<String>,
    /// Image reference per color.
    pub images: BTreeMap<String, String>,
}

impl Product {
    /// Check the product invariants.
    ///
    /// # Errors
    ///
    /// Returns the first [`CatalogError`] found.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.price < Decimal::ZERO {
            return Err(CatalogError::NegativePrice(self.id));
        }
        if self.sizes.is_empty() {
            return Err(CatalogError::NoSizes(self.id));
        }
        if self.colors.is_empty() {
            return Err(CatalogError::NoColors(self.id));
        }
        if let Some(color) = self
            .colors
            .iter()
            .find(|color| !self.images.contains_key(*color))
        {
            return Err(CatalogError::MissingImage {
                id: self.id,
                color: color.clone(),
            });
        }
        Ok(())
    }

    /// Whether `size` is one of the product's sizes.
    #[must_use]
    pub fn has_size(&self, size: &str) -> bool {
        self.sizes.iter().any(|s| s == size)
    }

    /// Whether `color` is one of the product's colors.
    #[must_use]
    pub fn has_color(&self, color: &str) -> bool {
        self.colors.iter().any(|c| c == color)
    }

    /// The preselected size (first in the list).
    #[must_use]
    pub fn default_size(&self) -> Option<&str> {
        self.sizes.first().map(String::as_str)
    }

    /// The preselected color (first in the list).
    #[must_use]
    pub fn default_color(&self) -> Option<&str> {
        self.colors.first().map(String::as_str)
    }

    /// Image reference for a color, if the product has one.
    #[must_use]
    pub fn image_for(&self, color: &str) -> Option<&str> {
        self.images.get(color).map(String::as_str)
    }
}

/// The set of products offered by the store, in display order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Build a catalog, keeping only products that satisfy their invariants.
    ///
    /// Rejected products are returned alongside the catalog so the caller can
    /// report them. Later duplicates of an id are rejected too.
    #[must_use]
    pub fn new(products: Vec<Product>) -> (Self, Vec<CatalogError>) {
        let mut accepted: Vec<Product> = Vec::with_capacity(products.len());
        let mut rejected = Vec::new();

        for product in products {
            if accepted.iter().any(|p| p.id == product.id) {
                rejected.push(CatalogError::DuplicateId(product.id));
                continue;
            }
            match product.validate() {
                Ok(()) => accepted.push(product),
                Err(e) => rejected.push(e),
            }
        }

        (Self { products: accepted }, rejected)
    }

    /// Parse a JSON array of products.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Parse`] if the document is not a product array.
    /// Invariant violations are not errors here; see [`Catalog::new`].
    pub fn from_json(json: &str) -> Result<(Self, Vec<CatalogError>), CatalogError> {
        let products: Vec<Product> =
            serde_json::from_str(json).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Ok(Self::new(products))
    }

    /// All products in display order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Look up a product by id.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
