//! Display preference actions.

use axum::{Form, extract::State, response::Redirect};
use serde::Deserialize;
use tower_cookies::Cookies;
use tracing::instrument;

use crate::forms::local_redirect_target;
use crate::middleware::{Preferences, set_theme};
use crate::models::Theme;
use crate::state::AppState;

/// Theme toggle form.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ThemeForm {
    /// Explicit theme; blank toggles the current one.
    pub theme: String,
    pub redirect_to: String,
}

/// Switch between light and dark theme.
#[instrument(skip(state, cookies, preferences))]
pub async fn toggle_theme(
    State(state): State<AppState>,
    cookies: Cookies,
    preferences: Preferences,
    Form(form): Form<ThemeForm>,
) -> Redirect {
    let theme = match form.theme.as_str() {
        "" => preferences.theme.toggled(),
        value => Theme::from_cookie(value),
    };
    set_theme(&cookies, theme, state.config().secure_cookies());

    Redirect::to(local_redirect_target(&form.redirect_to).unwrap_or("/"))
}
