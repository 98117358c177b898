//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                         - Home page
//! GET  /health                   - Health check
//!
//! # Catalogue
//! GET  /products                 - Product listing
//! GET  /products/{slug}          - Product detail
//! GET  /search?q=                - Product search
//!
//! # Cart (requires auth)
//! GET  /cart                     - Cart page
//!
//! # Checkout (requires auth)
//! GET  /checkout                 - Checkout page
//! POST /checkout                 - Place order (Pay Now)
//! GET  /checkout/summary         - Order summary fragment (HTMX)
//!
//! # Auth
//! GET  /login                    - Login page
//! POST /login                    - Login action (rate limited)
//! GET  /register                 - Register page
//! POST /register                 - Register action (rate limited)
//! POST /logout                   - Logout action
//! GET  /auth/callback            - Social login callback
//!
//! # Account (requires auth)
//! GET  /dashboard                - Profile, addresses and order history
//! GET  /orders/{id}              - Order detail
//!
//! # Actions
//! POST /action/user/profile      - Update name and phone
//! POST /action/user/address      - Create or update an address
//! POST /action/user/cart         - Change a line quantity (0 removes)
//! POST /action/user/cart/add     - Add a product to the cart
//! POST /action/user/cart/clear   - Empty the cart
//! POST /action/auth/google       - Start Google sign in (rate limited)
//! POST /action/theme             - Switch light/dark theme
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod layout;
pub mod preferences;
pub mod products;
pub mod search;
pub mod social_auth;
pub mod user_actions;

use axum::{
    Router,
    handler::Handler,
    routing::{get, post},
};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            get(auth::login_page).post(auth::login.layer(auth_rate_limiter())),
        )
        .route(
            "/register",
            get(auth::register_page).post(auth::register.layer(auth_rate_limiter())),
        )
        .route("/logout", get(auth::logout).post(auth::logout))
        .route("/auth/callback", get(social_auth::callback))
}

/// Create the form action routes router.
pub fn action_routes() -> Router<AppState> {
    Router::new()
        .route("/user/profile", post(user_actions::update_profile))
        .route("/user/address", post(user_actions::save_address))
        .route("/user/cart", post(cart::update_quantity))
        .route("/user/cart/add", post(cart::add))
        .route("/user/cart/clear", post(cart::clear))
        .route(
            "/auth/google",
            post(social_auth::google.layer(auth_rate_limiter())),
        )
        .route("/theme", post(preferences::toggle_theme))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{slug}", get(products::show))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show).post(checkout::place_order))
        .route("/summary", get(checkout::summary))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health))
        .nest("/products", product_routes())
        .route("/search", get(search::search))
        .route("/cart", get(cart::show))
        .nest("/checkout", checkout_routes())
        .route("/dashboard", get(account::dashboard))
        .route("/orders/{id}", get(account::order))
        .merge(auth_routes())
        .nest("/action", action_routes())
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}
