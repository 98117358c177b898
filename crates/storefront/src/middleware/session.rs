//! Session extractor backed by the encrypted session cookie.
//!
//! Requires `CookieManagerLayer` on the router.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::Response,
};
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::models::{AuthUser, Session, SessionState, SessionStore};
use crate::state::AppState;

/// Toast shown on the login page after the backend rejected the session.
pub const SESSION_EXPIRED_TOAST: &str = "Your session has expired. Please sign in again.";

/// Response extension: the backend rejected this session's token.
///
/// Set by [`AuthRejection::Expired`](crate::middleware::AuthRejection) and by
/// `AppError` for upstream `401`s; [`session_expiry_middleware`] acts on it.
#[derive(Debug, Clone, Copy)]
pub struct SessionExpired;

/// Replace the session cookie with an anonymous one when a handler reports
/// [`SessionExpired`].
///
/// Must run inside `CookieManagerLayer`.
pub async fn session_expiry_middleware(
    State(state): State<AppState>,
    cookies: Cookies,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;

    if response.extensions().get::<SessionExpired>().is_some() {
        tracing::info!("Backend rejected session token, signing out");
        crate::error::clear_sentry_user();
        let mut session = Session::default();
        session.flash(SESSION_EXPIRED_TOAST);
        state.sessions().commit_session(&cookies, &session);
    }

    response
}

/// The current request's session.
///
/// Mutating methods write the updated cookie immediately, so handlers never
/// need a separate commit step.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(mut session: CurrentSession) -> Redirect {
///     session.flash("Saved!");
///     Redirect::to("/")
/// }
/// ```
pub struct CurrentSession {
    session: Session,
    cookies: Cookies,
    store: SessionStore,
}

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookies = Cookies::from_request_parts(parts, state).await?;
        let session = state.sessions().get_session(&cookies);

        Ok(Self {
            session,
            cookies,
            store: state.sessions().clone(),
        })
    }
}

impl CurrentSession {
    /// The signed-in user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&AuthUser> {
        self.session.user()
    }

    /// Bearer token for backend calls, if signed in.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.session.token()
    }

    /// Establish an authenticated session with a welcome toast.
    pub fn sign_in(&mut self, user: AuthUser, toast: impl Into<String>) {
        crate::error::set_sentry_user(&user.user_id, Some(&user.user.email));
        self.session.sign_in(user);
        self.session.flash(toast);
        self.commit();
    }

    /// Update the name shown in the navigation after a profile change.
    pub fn set_display_name(&mut self, name: &str) {
        if let SessionState::Authenticated(user) = &mut self.session.state {
            name.clone_into(&mut user.user.name);
            self.commit();
        }
    }

    /// Drop the session entirely (logout).
    pub fn destroy(&mut self) {
        crate::error::clear_sentry_user();
        self.session = Session::default();
        self.store.destroy_session(&self.cookies);
    }

    /// Queue a toast for the next rendered page.
    pub fn flash(&mut self, message: impl Into<String>) {
        self.session.flash(message);
        self.commit();
    }

    /// Start a social sign-in and return the nonce to round-trip through the
    /// provider.
    pub fn begin_social_sign_in(&mut self) -> String {
        let state = Uuid::new_v4().simple().to_string();
        self.session.begin_social_sign_in(state.clone());
        self.commit();
        state
    }

    /// Check the nonce returned to the callback. Always clears it.
    pub fn finish_social_sign_in(&mut self, returned: &str) -> bool {
        let matches = self.session.finish_social_sign_in(returned);
        self.commit();
        matches
    }

    /// Take the pending toast for rendering; it will not be shown again.
    pub fn take_toast(&mut self) -> Option<String> {
        let toast = self.session.take_toast();
        if toast.is_some() {
            self.commit();
        }
        toast
    }

    fn commit(&self) {
        self.store.commit_session(&self.cookies, &self.session);
    }
}
