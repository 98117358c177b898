//! Typed JSON client bound to one backend base URL.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::ApiError;

/// Longest upstream error message kept in an [`ApiError::Api`].
const MAX_ERROR_MESSAGE_LEN: usize = 200;

/// HTTP client for one backend service.
///
/// Cheap to clone. Every call takes an optional bearer token so one client can
/// serve both anonymous and signed-in requests.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    service: &'static str,
}

impl ApiClient {
    /// Create a client for `service` rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(service: &'static str, base_url: &Url, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("clacie-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        // Url::join replaces the last segment unless the base ends with '/'
        let mut base_url = base_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url,
                service,
            }),
        })
    }

    /// Resolve a path (optionally with a query string) against the base URL.
    ///
    /// # Errors
    ///
    /// Returns error if the joined URL is invalid.
    pub fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path.trim_start_matches('/'))?)
    }

    /// `GET` a JSON resource.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response is not the expected JSON.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
    ) -> Result<T, ApiError> {
        let request = self.request(Method::GET, path, token)?;
        self.send(request, path).await
    }

    /// `POST` a JSON body.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response is not the expected JSON.
    pub async fn post<B, T>(
        &self,
        path: &str,
        body: &B,
        token: Option<&str>,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::POST, path, token)?.json(body);
        self.send(request, path).await
    }

    /// `PATCH` a JSON body.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response is not the expected JSON.
    pub async fn patch<B, T>(
        &self,
        path: &str,
        body: &B,
        token: Option<&str>,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::PATCH, path, token)?.json(body);
        self.send(request, path).await
    }

    /// `DELETE` a resource.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response is not the expected JSON.
    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
    ) -> Result<T, ApiError> {
        let request = self.request(Method::DELETE, path, token)?;
        self.send(request, path).await
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
    ) -> Result<RequestBuilder, ApiError> {
        let url = self.url(path)?;
        let request = self
            .inner
            .client
            .request(method, url)
            .header("Accept", "application/json");

        Ok(match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }

    #[instrument(skip(self, request), fields(service = self.inner.service))]
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        path: &str,
    ) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "Upstream response");

        if !status.is_success() {
            return Err(error_for_status(status, path, &body));
        }

        // Empty bodies (204, bare 200) decode as JSON null
        let body = if body.trim().is_empty() { "null" } else { &body };
        Ok(serde_json::from_str(body)?)
    }
}

/// Map a non-success response onto an [`ApiError`].
fn error_for_status(status: StatusCode, path: &str, body: &str) -> ApiError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized,
        StatusCode::NOT_FOUND => ApiError::NotFound(path.to_string()),
        _ => ApiError::Api {
            status: status.as_u16(),
            message: extract_message(body),
        },
    }
}

/// Pull the human readable message out of an error body.
///
/// The services answer `{"message": "..."}`; some auth errors use `error`.
fn extract_message(body: &str) -> String {
    let value = serde_json::from_str::<serde_json::Value>(body).ok();
    let message = value
        .as_ref()
        .and_then(|value| {
            ["message", "error"]
                .iter()
                .find_map(|key| value.get(*key).and_then(serde_json::Value::as_str))
        })
        .unwrap_or(body);

    message.trim().chars().take(MAX_ERROR_MESSAGE_LEN).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new("test", &Url::parse(base).unwrap(), Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_url_keeps_base_path() {
        let api = client("http://localhost:8001/api/auth");
        assert_eq!(
            api.url("/sign-in/email").unwrap().as_str(),
            "http://localhost:8001/api/auth/sign-in/email"
        );
    }

    #[test]
    fn test_url_with_query() {
        let api = client("http://localhost:8000/");
        assert_eq!(
            api.url("search?q=choco%20chip").unwrap().as_str(),
            "http://localhost:8000/search?q=choco%20chip"
        );
    }

    #[test]
    fn test_extract_message() {
        assert_eq!(extract_message(r#"{"message":"Cart is empty"}"#), "Cart is empty");
        assert_eq!(extract_message(r#"{"error":"Invalid token"}"#), "Invalid token");
        assert_eq!(extract_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn test_extract_message_is_truncated() {
        let long = "x".repeat(MAX_ERROR_MESSAGE_LEN * 2);
        let json = format!(r#"{{"message":"{long}"}}"#);
        assert_eq!(extract_message(&json).chars().count(), MAX_ERROR_MESSAGE_LEN);
        assert_eq!(extract_message(&long).chars().count(), MAX_ERROR_MESSAGE_LEN);
    }

    #[test]
    fn test_error_for_status() {
        assert!(matches!(
            error_for_status(StatusCode::FORBIDDEN, "/cart", ""),
            ApiError::Unauthorized
        ));
        assert!(matches!(
            error_for_status(StatusCode::NOT_FOUND, "/products/x", ""),
            ApiError::NotFound(path) if path == "/products/x"
        ));
        assert!(matches!(
            error_for_status(
                StatusCode::UNPROCESSABLE_ENTITY,
                "/checkout",
                r#"{"message":"No stock"}"#
            ),
            ApiError::Api { status: 422, message } if message == "No stock"
        ));
    }
}
