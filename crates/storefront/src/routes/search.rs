//! Search route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use serde::Deserialize;
use tracing::instrument;

use crate::api::Product;
use crate::filters;
use crate::middleware::{CurrentSession, Preferences};
use crate::routes::layout::LayoutContext;
use crate::state::AppState;

/// Longest query forwarded to the backend.
const MAX_QUERY_LEN: usize = 100;

/// Search query parameters.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    pub q: String,
}

/// Search results page template.
#[derive(Template, WebTemplate)]
#[template(path = "search.html")]
pub struct SearchTemplate {
    pub layout: LayoutContext,
    pub query: String,
    pub results: Vec<Product>,
    pub search_failed: bool,
}

/// Display search results.
///
/// A blank query renders the empty search page without calling the backend.
#[instrument(skip(state, session, preferences))]
pub async fn search(
    State(state): State<AppState>,
    mut session: CurrentSession,
    preferences: Preferences,
    Query(params): Query<SearchQuery>,
) -> SearchTemplate {
    let query: String = params.q.trim().chars().take(MAX_QUERY_LEN).collect();

    let (results, search_failed) = if query.is_empty() {
        (Vec::new(), false)
    } else {
        match state.commerce().search(&query).await {
            Ok(results) => (results, false),
            Err(e) => {
                tracing::warn!("Search failed for {query:?}: {e}");
                (Vec::new(), true)
            }
        }
    };

    SearchTemplate {
        layout: LayoutContext::new(&mut session, preferences, "/search"),
        query,
        results,
        search_failed,
    }
}
