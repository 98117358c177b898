//! Session cookie model.
//!
//! One encrypted cookie carries the whole session: who is signed in, the
//! bearer token for the backend APIs, and an optional one-shot toast.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use tower_cookies::cookie::time::Duration;
use tower_cookies::cookie::{Cookie, SameSite};
use tower_cookies::{Cookies, Key};

use clacie_core::{Email, UserId};

use crate::api::{AuthResponse, User};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "__clacie_session_cookie";

/// Session lifetime (7 days).
const SESSION_MAX_AGE_DAYS: i64 = 7;

/// Everything the storefront remembers about a browser between requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub state: SessionState,
    /// Shown once by the layout, then dropped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toast_message: Option<String>,
    /// Nonce of a social sign-in started by this browser.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_state: Option<String>,
}

/// Authentication state of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticated(AuthUser),
}

/// A signed-in user and the token used to call the backends on their behalf.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub token: String,
    pub user_id: UserId,
    pub user: SessionUser,
}

/// Identity details kept in the cookie for the navigation bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub name: String,
    pub email: Email,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl std::fmt::Debug for AuthUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthUser")
            .field("token", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .field("user", &self.user)
            .finish()
    }
}

impl AuthUser {
    #[must_use]
    pub fn new(token: String, user: User) -> Self {
        Self {
            token,
            user_id: user.id,
            user: SessionUser {
                name: user.name,
                email: user.email,
                image: user.image,
            },
        }
    }
}

impl From<AuthResponse> for AuthUser {
    fn from(response: AuthResponse) -> Self {
        Self::new(response.token, response.user)
    }
}

impl Session {
    /// The signed-in user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&AuthUser> {
        match &self.state {
            SessionState::Authenticated(user) => Some(user),
            SessionState::Anonymous => None,
        }
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.user().map(|user| user.token.as_str())
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated(_))
    }

    pub fn sign_in(&mut self, user: AuthUser) {
        self.state = SessionState::Authenticated(user);
    }

    pub fn sign_out(&mut self) {
        self.state = SessionState::Anonymous;
    }

    /// Queue a toast for the next rendered page.
    pub fn flash(&mut self, message: impl Into<String>) {
        self.toast_message = Some(message.into());
    }

    /// Take the pending toast, leaving none behind.
    pub fn take_toast(&mut self) -> Option<String> {
        self.toast_message.take()
    }

    /// Remember the nonce of a social sign-in that is about to start.
    pub fn begin_social_sign_in(&mut self, state: impl Into<String>) {
        self.social_state = Some(state.into());
    }

    /// Consume the pending social sign-in nonce and compare it to `returned`.
    ///
    /// The nonce is single use: it is cleared whether or not it matches.
    pub fn finish_social_sign_in(&mut self, returned: &str) -> bool {
        self.social_state
            .take()
            .is_some_and(|expected| !returned.is_empty() && expected == returned)
    }

    /// Whether there is nothing worth persisting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.is_authenticated() && self.toast_message.is_none() && self.social_state.is_none()
    }
}

/// Serialize a session for the cookie payload.
///
/// # Errors
///
/// Returns error if serialization fails.
pub fn encode_session(session: &Session) -> Result<String, serde_json::Error> {
    serde_json::to_string(session)
}

/// Parse a cookie payload; anything unreadable is an anonymous session.
#[must_use]
pub fn decode_session(value: &str) -> Session {
    serde_json::from_str(value).unwrap_or_default()
}

/// Reads and writes the encrypted session cookie.
#[derive(Clone)]
pub struct SessionStore {
    key: Key,
    secure: bool,
}

impl SessionStore {
    /// Derive the cookie key from the configured secret.
    #[must_use]
    pub fn new(secret: &SecretString, secure: bool) -> Self {
        // SHA-512 gives exactly the 64 bytes of key material the jar needs
        let digest = Sha512::digest(secret.expose_secret().as_bytes());
        Self {
            key: Key::from(digest.as_slice()),
            secure,
        }
    }

    /// Read the session for this request.
    ///
    /// Missing, tampered, or unparseable cookies yield an anonymous session.
    #[must_use]
    pub fn get_session(&self, cookies: &Cookies) -> Session {
        cookies
            .private(&self.key)
            .get(SESSION_COOKIE_NAME)
            .map(|cookie| decode_session(cookie.value()))
            .unwrap_or_default()
    }

    /// Persist the session, or clear the cookie when there is nothing to keep.
    pub fn commit_session(&self, cookies: &Cookies, session: &Session) {
        if session.is_empty() {
            self.destroy_session(cookies);
            return;
        }

        match encode_session(session) {
            Ok(value) => {
                let cookie = Cookie::build((SESSION_COOKIE_NAME, value))
                    .path("/")
                    .http_only(true)
                    .same_site(SameSite::Lax)
                    .secure(self.secure)
                    .max_age(Duration::days(SESSION_MAX_AGE_DAYS))
                    .build();
                cookies.private(&self.key).add(cookie);
            }
            Err(e) => tracing::error!("Failed to serialize session: {e}"),
        }
    }

    /// Clear the session cookie.
    pub fn destroy_session(&self, cookies: &Cookies) {
        cookies
            .private(&self.key)
            .remove(Cookie::build(SESSION_COOKIE_NAME).path("/").build());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn signed_in() -> Session {
        let mut session = Session::default();
        session.sign_in(AuthUser {
            token: "tok_123".to_string(),
            user_id: UserId::new("u1"),
            user: SessionUser {
                name: "Sari".to_string(),
                email: Email::parse("sari@clacie.id").unwrap(),
                image: None,
            },
        });
        session
    }

    #[test]
    fn test_default_is_anonymous() {
        let session = Session::default();
        assert!(!session.is_authenticated());
        assert!(session.token().is_none());
        assert!(session.is_empty());
    }

    #[test]
    fn test_sign_in_and_out() {
        let mut session = signed_in();
        assert_eq!(session.token(), Some("tok_123"));
        session.sign_out();
        assert!(session.user().is_none());
    }

    #[test]
    fn test_toast_is_one_shot() {
        let mut session = Session::default();
        session.flash("Welcome back!");
        assert!(!session.is_empty());
        assert_eq!(session.take_toast().as_deref(), Some("Welcome back!"));
        assert_eq!(session.take_toast(), None);
    }

    #[test]
    fn test_social_state_is_single_use() {
        let mut session = Session::default();
        session.begin_social_sign_in("a1b2c3");
        assert!(!session.is_empty());
        assert!(session.finish_social_sign_in("a1b2c3"));
        assert!(!session.finish_social_sign_in("a1b2c3"));
        assert!(session.is_empty());
    }

    #[test]
    fn test_social_state_mismatch() {
        let mut session = Session::default();
        assert!(!session.finish_social_sign_in(""));
        session.begin_social_sign_in("a1b2c3");
        assert!(!session.finish_social_sign_in("forged"));
        assert!(session.social_state.is_none());
    }

    #[test]
    fn test_encode_decode() {
        let mut session = signed_in();
        session.flash("Logged in");
        let encoded = encode_session(&session).unwrap();
        assert!(encoded.contains("\"kind\":\"authenticated\""));
        assert_eq!(decode_session(&encoded), session);
    }

    #[test]
    fn test_decode_garbage_is_anonymous() {
        assert_eq!(decode_session("not json"), Session::default());
        assert_eq!(decode_session(r#"{"state":{"kind":"admin"}}"#), Session::default());
    }

    #[test]
    fn test_debug_redacts_token() {
        let session = signed_in();
        let debug = format!("{session:?}");
        assert!(!debug.contains("tok_123"));
        assert!(debug.contains("[REDACTED]"));
    }
}
