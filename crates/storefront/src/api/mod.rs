//! HTTP clients for the Clacie backend services.
//!
//! # Architecture
//!
//! - One [`ApiClient`] per external service, bound to its base URL
//! - The backends are the source of truth: no local sync, no response cache
//! - Bearer tokens come from the session and are forwarded per request
//!
//! ## Commerce API
//! - Products, search, cart, addresses, shipping/payment catalogs, checkout
//! - Orders
//!
//! ## Auth service
//! - Email sign-in and sign-up, social sign-in
//! - Session lookup and profile updates
//!
//! # Example
//!
//! ```rust,ignore
//! let commerce = CommerceClient::new(ApiClient::new("commerce", &config.commerce_url, timeout)?);
//!
//! let product = commerce.product("choco-chip").await?;
//! commerce.add_to_cart(&token, &product.id, 2).await?;
//! ```

mod auth;
mod client;
mod commerce;
pub mod types;

pub use auth::AuthClient;
pub use client::ApiClient;
pub use commerce::CommerceClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when talking to a backend service.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The bearer token was missing, expired, or rejected.
    #[error("Unauthorized")]
    Unauthorized,

    /// The service answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// A request URL could not be built from the base URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    /// Whether the service rejected the request itself (4xx) rather than failing.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        match self {
            Self::Unauthorized | Self::NotFound(_) => true,
            Self::Api { status, .. } => *status >= 400 && *status < 500,
            _ => false,
        }
    }

    /// Message suitable for showing next to a form, if the service sent one.
    #[must_use]
    pub fn user_message(&self) -> Option<&str> {
        match self {
            Self::Api { status, message } if *status < 500 && !message.is_empty() => {
                Some(message)
            }
            _ => None,
        }
    }
}
