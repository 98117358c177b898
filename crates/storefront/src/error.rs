//! Storefront error type and Sentry helpers.
//!
//! Handlers return [`Result`] for failures that should replace the whole
//! page. Failures a page can live without (optional data, sub-form saves) are
//! handled in the handler instead and never reach this type.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use clacie_core::{Email, UserId};
use thiserror::Error;

use crate::api::ApiError;
use crate::middleware::{LOGIN_PATH, SessionExpired};

/// A request that could not be served.
#[derive(Debug, Error)]
pub enum AppError {
    /// Commerce or auth API call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// The page refers to something that does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed path or query input.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// HTTP status for this error.
    ///
    /// Upstream 404s stay 404; any other upstream failure is a bad gateway.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Api(ApiError::NotFound(_)) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Api(ApiError::Unauthorized) => StatusCode::UNAUTHORIZED,
            Self::Api(_) => StatusCode::BAD_GATEWAY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Text safe to show a shopper. Never includes upstream details.
    #[must_use]
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::Api(ApiError::NotFound(_)) | Self::NotFound(_) => {
                "We couldn't find what you were looking for."
            }
            Self::BadRequest(_) => "That link doesn't look right.",
            Self::Api(_) => "The shop is having trouble right now. Please try again in a moment.",
        }
    }
}

/// Standalone error page. Rendered without the session, so no navigation.
#[derive(Template, WebTemplate)]
#[template(path = "error.html")]
struct ErrorTemplate {
    status: u16,
    message: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Expired or revoked token: sign out and sign in again
        if status == StatusCode::UNAUTHORIZED {
            let mut response = Redirect::to(LOGIN_PATH).into_response();
            response.extensions_mut().insert(SessionExpired);
            return response;
        }

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let page = ErrorTemplate {
            status: status.as_u16(),
            message: self.public_message(),
        };
        (status, page).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Attach the signed-in shopper to subsequent Sentry events.
pub fn set_sentry_user(user_id: &UserId, email: Option<&Email>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(ToString::to_string),
            ..Default::default()
        }));
    });
}

/// Forget the shopper on logout.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| scope.set_user(None));
}

/// Record a shopper action as a Sentry breadcrumb.
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Updated quantity", Some(&[("item_id", "42")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let data = data
        .unwrap_or_default()
        .iter()
        .map(|(key, value)| ((*key).to_string(), serde_json::Value::from(*value)))
        .collect();

    sentry::add_breadcrumb(sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        data,
        ..Default::default()
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::header::LOCATION;

    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::NotFound("cookie".to_string()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::BadRequest("id".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Api(ApiError::NotFound("/orders/9".to_string())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Api(ApiError::Api {
                status: 500,
                message: "boom".to_string()
            })
            .status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_upstream_detail_is_not_exposed() {
        let err = AppError::Api(ApiError::Api {
            status: 500,
            message: "db password rejected".to_string(),
        });
        assert!(!err.public_message().contains("password"));
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_unauthorized_redirects_to_login() {
        let response = AppError::Api(ApiError::Unauthorized).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(LOCATION).unwrap(), "/login");
        assert!(response.extensions().get::<SessionExpired>().is_some());
    }
}
