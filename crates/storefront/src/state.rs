//! Application state shared across handlers.

use std::sync::Arc;

use crate::api::{ApiClient, ApiError, AuthClient, CommerceClient};
use crate::config::StorefrontConfig;
use crate::models::SessionStore;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// configuration, the backend clients and the session cookie codec.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    commerce: CommerceClient,
    auth: AuthClient,
    sessions: SessionStore,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, ApiError> {
        let timeout = config.upstream.timeout;
        let commerce = CommerceClient::new(ApiClient::new(
            "commerce",
            &config.upstream.commerce_url,
            timeout,
        )?);
        let auth = AuthClient::new(ApiClient::new("auth", &config.upstream.auth_url, timeout)?);
        let sessions = SessionStore::new(&config.session_secret, config.secure_cookies());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                commerce,
                auth,
                sessions,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the commerce API client.
    #[must_use]
    pub fn commerce(&self) -> &CommerceClient {
        &self.inner.commerce
    }

    /// Get a reference to the auth service client.
    #[must_use]
    pub fn auth(&self) -> &AuthClient {
        &self.inner.auth
    }

    /// Get a reference to the session cookie store.
    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.inner.sessions
    }
}
