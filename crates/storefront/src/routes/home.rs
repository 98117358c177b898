//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use crate::api::Product;
use crate::filters;
use crate::middleware::{CurrentSession, Preferences};
use crate::routes::layout::LayoutContext;
use crate::state::AppState;

/// Number of products featured on the home page.
const FEATURED_PRODUCTS: usize = 8;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: LayoutContext,
    pub featured: Vec<Product>,
    pub catalog_unavailable: bool,
}

/// Display home page.
///
/// The catalog is optional here: if it fails the hero still renders.
#[instrument(skip(state, session, preferences))]
pub async fn home(
    State(state): State<AppState>,
    mut session: CurrentSession,
    preferences: Preferences,
) -> HomeTemplate {
    let (featured, catalog_unavailable) = match state.commerce().products().await {
        Ok(products) => (
            products.into_iter().take(FEATURED_PRODUCTS).collect(),
            false,
        ),
        Err(e) => {
            tracing::warn!("Failed to fetch featured products: {e}");
            (Vec::new(), true)
        }
    };

    HomeTemplate {
        layout: LayoutContext::new(&mut session, preferences, "/"),
        featured,
        catalog_unavailable,
    }
}
