//! Auth service: email and social sign-in, session lookup, profile.

use serde::de::IgnoredAny;
use tracing::instrument;

use super::types::{
    AuthResponse, SessionResponse, SignInEmailRequest, SignUpEmailRequest, SocialSignInRequest,
    SocialSignInResponse, UpdateProfileRequest, User,
};
use super::{ApiClient, ApiError};

/// Client for the auth service.
#[derive(Clone)]
pub struct AuthClient {
    api: ApiClient,
}

impl AuthClient {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` (or a 4xx `ApiError::Api`) for bad credentials.
    #[instrument(skip(self, password))]
    pub async fn sign_in_email(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, ApiError> {
        let body = SignInEmailRequest { email, password };
        self.api.post("/sign-in/email", &body, None).await
    }

    /// Create an account and sign in.
    ///
    /// # Errors
    ///
    /// Returns a 4xx `ApiError::Api` if the email is already registered.
    #[instrument(skip(self, password))]
    pub async fn sign_up_email(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, ApiError> {
        let body = SignUpEmailRequest {
            name,
            email,
            password,
        };
        self.api.post("/sign-up/email", &body, None).await
    }

    /// Ask the auth service where to send the browser for social login.
    ///
    /// # Errors
    ///
    /// Returns error if the provider is not configured upstream.
    #[instrument(skip(self))]
    pub async fn sign_in_social(
        &self,
        provider: &str,
        callback_url: &str,
    ) -> Result<SocialSignInResponse, ApiError> {
        let body = SocialSignInRequest {
            provider,
            callback_url,
        };
        self.api.post("/sign-in/social", &body, None).await
    }

    /// Resolve a token to its user.
    ///
    /// The service answers `null` for unknown tokens, which surfaces as
    /// `ApiError::Unauthorized`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the token is invalid or expired.
    #[instrument(skip(self, token))]
    pub async fn session(&self, token: &str) -> Result<SessionResponse, ApiError> {
        let session: Option<SessionResponse> = self.api.get("/get-session", Some(token)).await?;
        session.ok_or(ApiError::Unauthorized)
    }

    /// Fetch the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the token is invalid or expired.
    pub async fn profile(&self, token: &str) -> Result<User, ApiError> {
        Ok(self.session(token).await?.user)
    }

    /// Update name and phone.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn update_profile(
        &self,
        token: &str,
        request: &UpdateProfileRequest,
    ) -> Result<(), ApiError> {
        let _: IgnoredAny = self.api.patch("/auth/profile", request, Some(token)).await?;
        Ok(())
    }
}
