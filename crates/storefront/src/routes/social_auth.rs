//! Social login through the auth service.
//!
//! # Flow
//!
//! 1. `POST /action/auth/google` stores a random `state` nonce in the session,
//!    asks the auth service for the provider URL and redirects the browser
//!    there.
//! 2. After consent the auth service sends the browser to
//!    `GET /auth/callback?state=...&token=...`.
//! 3. The `state` must match the nonce in this browser's session, then the
//!    token is checked with `GET /get-session` before it is trusted.

use axum::{
    extract::{Query, State},
    response::Redirect,
};
use serde::Deserialize;
use tracing::instrument;

use crate::middleware::{CurrentSession, LOGIN_PATH};
use crate::models::AuthUser;
use crate::state::AppState;

const GOOGLE_PROVIDER: &str = "google";

/// Query parameters on the social login callback.
#[derive(Default, Deserialize)]
#[serde(default)]
pub struct CallbackQuery {
    pub state: String,
    pub token: String,
    pub error: String,
}

/// Start Google sign-in.
#[instrument(skip(state, session))]
pub async fn google(State(state): State<AppState>, mut session: CurrentSession) -> Redirect {
    let nonce = session.begin_social_sign_in();
    let callback_url = state.config().social_callback_url(&nonce);

    match state
        .auth()
        .sign_in_social(GOOGLE_PROVIDER, &callback_url)
        .await
    {
        Ok(response) => Redirect::to(&response.url),
        Err(e) => {
            tracing::error!("Failed to start Google sign-in: {e}");
            session.flash("Google sign-in is unavailable right now. Please try again.");
            Redirect::to(LOGIN_PATH)
        }
    }
}

/// Finish social sign-in.
#[instrument(skip(state, session, query))]
pub async fn callback(
    State(state): State<AppState>,
    mut session: CurrentSession,
    Query(query): Query<CallbackQuery>,
) -> Redirect {
    let state_matches = session.finish_social_sign_in(query.state.trim());

    let token = query.token.trim();
    if token.is_empty() {
        if !query.error.is_empty() {
            tracing::info!(error = %query.error, "Social sign-in was not completed");
        }
        session.flash("Sign-in was cancelled or failed. Please try again.");
        return Redirect::to(LOGIN_PATH);
    }

    if !state_matches {
        tracing::warn!("Social sign-in callback with missing or unknown state");
        session.flash("Sign-in failed. Please try again.");
        return Redirect::to(LOGIN_PATH);
    }

    match state.auth().session(token).await {
        Ok(response) => {
            let user = AuthUser::new(token.to_string(), response.user);
            tracing::info!(user_id = %user.user_id, "User logged in with Google");
            let toast = format!("Welcome, {}!", user.user.name);
            session.sign_in(user, toast);
            Redirect::to("/")
        }
        Err(e) => {
            tracing::warn!("Social sign-in token rejected: {e}");
            session.flash("Sign-in failed. Please try again.");
            Redirect::to(LOGIN_PATH)
        }
    }
}
