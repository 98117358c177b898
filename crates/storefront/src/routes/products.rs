//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use tracing::instrument;

use crate::api::{ApiError, Product};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{CurrentSession, Preferences};
use crate::routes::layout::LayoutContext;
use crate::state::AppState;

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub layout: LayoutContext,
    pub products: Vec<Product>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub layout: LayoutContext,
    pub product: Product,
    pub max_quantity: u32,
}

/// Display product listing page.
#[instrument(skip(state, session, preferences))]
pub async fn index(
    State(state): State<AppState>,
    mut session: CurrentSession,
    preferences: Preferences,
) -> Result<ProductsIndexTemplate> {
    let products = state.commerce().products().await?;

    Ok(ProductsIndexTemplate {
        layout: LayoutContext::new(&mut session, preferences, "/products"),
        products,
    })
}

/// Display product detail page.
#[instrument(skip(state, session, preferences))]
pub async fn show(
    State(state): State<AppState>,
    mut session: CurrentSession,
    preferences: Preferences,
    Path(slug): Path<String>,
) -> Result<ProductShowTemplate> {
    let product = state
        .commerce()
        .product(&slug)
        .await
        .map_err(|e| match e {
            ApiError::NotFound(_) => AppError::NotFound(format!("Product not found: {slug}")),
            other => AppError::Api(other),
        })?;

    let max_quantity = product.stock_quantity.min(crate::forms::cart::MAX_QUANTITY);

    Ok(ProductShowTemplate {
        layout: LayoutContext::new(&mut session, preferences, &format!("/products/{slug}")),
        product,
        max_quantity,
    })
}
