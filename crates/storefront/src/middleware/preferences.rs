//! Theme preference extractor.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_cookies::Cookies;
use tower_cookies::cookie::time::Duration;
use tower_cookies::cookie::{Cookie, SameSite};

use crate::models::{THEME_COOKIE_NAME, Theme};

/// Preference cookie lifetime (one year).
const PREFERENCE_MAX_AGE_DAYS: i64 = 365;

/// Display preferences read from plain cookies at request start.
#[derive(Debug, Clone, Copy, Default)]
pub struct Preferences {
    pub theme: Theme,
}

impl<S> FromRequestParts<S> for Preferences
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let theme = Cookies::from_request_parts(parts, state)
            .await
            .ok()
            .and_then(|cookies| {
                cookies
                    .get(THEME_COOKIE_NAME)
                    .map(|cookie| Theme::from_cookie(cookie.value()))
            })
            .unwrap_or_default();

        Ok(Self { theme })
    }
}

/// Persist the theme preference.
pub fn set_theme(cookies: &Cookies, theme: Theme, secure: bool) {
    let cookie = Cookie::build((THEME_COOKIE_NAME, theme.as_str()))
        .path("/")
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::days(PREFERENCE_MAX_AGE_DAYS))
        .build();
    cookies.add(cookie);
}
