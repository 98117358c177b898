//! HTTP middleware stack and request extractors for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (CSP, frame denial, etc.)
//! 5. Cookie manager (`tower-cookies`, needed by the session extractors)
//! 6. Session expiry (signs out browsers whose backend token was rejected)
//!
//! Rate limiting (governor) is applied per handler on the auth actions.

pub mod auth;
pub mod htmx;
pub mod preferences;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{AuthRejection, LOGIN_PATH, RequireAuth};
pub use htmx::HxRequest;
pub use preferences::{Preferences, set_theme};
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{CurrentSession, SessionExpired, session_expiry_middleware};
