//! Domain models for storefront.
//!
//! Everything here lives in cookies; the backends own all other data.

pub mod preferences;
pub mod session;

pub use preferences::{THEME_COOKIE_NAME, Theme};
pub use session::{
    AuthUser, SESSION_COOKIE_NAME, Session, SessionState, SessionStore, SessionUser,
};
