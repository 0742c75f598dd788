//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use crate::routes::cart::open_cart;
use crate::routes::products::ProductView;
use crate::state::AppState;

/// Home page template: the product listing.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub products: Vec<ProductView>,
    pub cart_count: usize,
}

/// Display the home page with a card per product.
#[instrument(skip(state, session))]
pub async fn home(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let products = state
        .catalog()
        .products()
        .iter()
        .map(|product| ProductView::new(&state, product, None, None))
        .collect();

    HomeTemplate {
        products,
        cart_count: open_cart(&session).await.len(),
    }
}
