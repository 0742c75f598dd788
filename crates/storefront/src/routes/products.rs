//! Product route handlers.

use amadasun_core::{Product, ProductId};
use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::routes::cart::open_cart;
use crate::state::AppState;

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: ProductId,
    pub name: String,
    pub short_description: String,
    pub description: String,
    pub price: String,
    pub image: String,
    pub sizes: Vec<OptionView>,
    pub colors: Vec<OptionView>,
}

/// One selectable size or color.
#[derive(Clone)]
pub struct OptionView {
    pub value: String,
    pub selected: bool,
}

impl ProductView {
    /// Build the view with `size` and `color` preselected.
    ///
    /// Options the product does not offer fall back to its first size or
    /// color.
    #[must_use]
    pub fn new(state: &AppState, product: &Product, size: Option<&str>, color: Option<&str>) -> Self {
        let size = size
            .filter(|s| product.has_size(s))
            .or_else(|| product.default_size())
            .unwrap_or_default();
        let color = color
            .filter(|c| product.has_color(c))
            .or_else(|| product.default_color())
            .unwrap_or_default();

        Self {
            id: product.id,
            name: product.name.clone(),
            short_description: product.short_description.clone(),
            description: product.description.clone(),
            price: state.format_price(product.price),
            image: product.image_for(color).unwrap_or_default().to_string(),
            sizes: options(&product.sizes, size),
            colors: options(&product.colors, color),
        }
    }

    /// Currently selected size.
    #[must_use]
    pub fn selected_size(&self) -> &str {
        selected(&self.sizes)
    }

    /// Currently selected color.
    #[must_use]
    pub fn selected_color(&self) -> &str {
        selected(&self.colors)
    }
}

fn options(values: &[String], selected: &str) -> Vec<OptionView> {
    values
        .iter()
        .map(|value| OptionView {
            value: value.clone(),
            selected: value == selected,
        })
        .collect()
}

fn selected(options: &[OptionView]) -> &str {
    options
        .iter()
        .find(|option| option.selected)
        .map_or("", |option| option.value.as_str())
}

/// Option selection carried in the product page address.
#[derive(Debug, Default, Deserialize)]
pub struct OptionsQuery {
    pub size: Option<String>,
    pub color: Option<String>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: ProductView,
    pub cart_count: usize,
}

/// Display product detail page.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Query(query): Query<OptionsQuery>,
) -> Result<impl IntoResponse> {
    let product = id
        .parse::<ProductId>()
        .ok()
        .and_then(|id| state.catalog().get(id))
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    let product = ProductView::new(
        &state,
        product,
        query.size.as_deref(),
        query.color.as_deref(),
    );
    let cart_count = open_cart(&session).await.len();

    Ok(ProductShowTemplate {
        product,
        cart_count,
    })
}
