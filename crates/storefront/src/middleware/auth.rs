//! Authentication extractors.
//!
//! Provides extractors for requiring a signed-in user in route handlers.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};

use crate::middleware::htmx::is_htmx;
use crate::middleware::session::{CurrentSession, SessionExpired};
use crate::models::AuthUser;
use crate::state::AppState;

/// Login page path.
pub const LOGIN_PATH: &str = "/login";

/// Extractor that requires a signed-in user.
///
/// Anonymous browsers are redirected to the login page. HTMX requests get
/// `401` with an `HX-Redirect` header so the whole page navigates instead of
/// swapping a login form into a fragment.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(auth: RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", auth.user.user.name)
/// }
/// ```
pub struct RequireAuth {
    pub user: AuthUser,
    pub session: CurrentSession,
}

impl RequireAuth {
    /// Bearer token for backend calls.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.user.token
    }
}

/// Error returned when authentication is required but the user is not logged in.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to login page (for full page requests).
    RedirectToLogin,
    /// Client-side redirect (for HTMX requests).
    HtmxRedirect,
    /// The backend rejected the session token; sign out, then redirect.
    Expired { htmx: bool },
    /// Cookies were unavailable.
    Cookies(StatusCode, &'static str),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::HtmxRedirect => {
                (StatusCode::UNAUTHORIZED, [("HX-Redirect", LOGIN_PATH)]).into_response()
            }
            Self::Expired { htmx } => {
                let mut response = Self::to_login(htmx).into_response();
                response.extensions_mut().insert(SessionExpired);
                response
            }
            Self::Cookies(status, message) => (status, message).into_response(),
        }
    }
}

impl AuthRejection {
    /// Rejection for a request whose backend token turned out to be invalid.
    #[must_use]
    pub const fn expired(htmx: bool) -> Self {
        Self::Expired { htmx }
    }

    const fn to_login(htmx: bool) -> Self {
        if htmx {
            Self::HtmxRedirect
        } else {
            Self::RedirectToLogin
        }
    }
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = CurrentSession::from_request_parts(parts, state)
            .await
            .map_err(|(status, message)| AuthRejection::Cookies(status, message))?;

        let Some(user) = session.user().cloned() else {
            return Err(AuthRejection::to_login(is_htmx(&parts.headers)));
        };

        Ok(Self { user, session })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::header::LOCATION;

    use super::*;

    #[test]
    fn test_anonymous_rejection_keeps_session() {
        let response = AuthRejection::to_login(false).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(LOCATION).unwrap(), LOGIN_PATH);
        assert!(response.extensions().get::<SessionExpired>().is_none());
    }

    #[test]
    fn test_expired_rejection_marks_session() {
        let response = AuthRejection::expired(true).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers().get("HX-Redirect").unwrap(), LOGIN_PATH);
        assert!(response.extensions().get::<SessionExpired>().is_some());
    }
}
