//! Integration test harness for the Clacie storefront.
//!
//! Each test spawns two servers on ephemeral ports:
//!
//! - a mock backend that answers both the commerce and the auth API and
//!   records every call it receives
//! - the real storefront router, pointed at the mock
//!
//! Tests then drive the storefront with a cookie-keeping `reqwest` client
//! that does not follow redirects.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p clacie-integration-tests
//! ```

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use clacie_storefront::build_app;
use clacie_storefront::config::{StorefrontConfig, UpstreamConfig};
use clacie_storefront::state::AppState;
use secrecy::SecretString;
use serde_json::{Value, json};
use url::Url;

/// Token the mock issues on a successful sign in.
pub const TEST_TOKEN: &str = "tok-budi-1";
/// Password the mock accepts.
pub const TEST_PASSWORD: &str = "kue-coklat-enak";
/// Email of the mock user.
pub const TEST_EMAIL: &str = "budi@example.com";
/// Display name of the mock user.
pub const TEST_NAME: &str = "Budi Santoso";

/// Name of the storefront session cookie.
pub const SESSION_COOKIE: &str = "__clacie_session_cookie";

const TEST_SESSION_SECRET: &str = "k8Jd2mQ9xL4vR7tW1zY6bN3cF5hG0pS8aE2uI9oK7jM4nB6v";

/// ID of the one order the mock knows about.
pub const TEST_ORDER_ID: &str = "ord-1";

/// Shared state of the mock backend.
#[derive(Default)]
pub struct MockState {
    cart: Mutex<Value>,
    calls: Mutex<Vec<String>>,
    checkout_reply: Mutex<Option<(StatusCode, Value)>>,
    failing: Mutex<Vec<&'static str>>,
    social_callback: Mutex<Option<String>>,
    tokens_revoked: AtomicBool,
}

impl MockState {
    fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: impl Into<String>) {
        Self::lock(&self.calls).push(call.into());
    }

    /// Calls received so far, formatted as `METHOD /path [body]`.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        Self::lock(&self.calls).clone()
    }

    /// Replace the cart the mock serves.
    pub fn set_cart(&self, cart: Value) {
        *Self::lock(&self.cart) = cart;
    }

    /// Answer `POST /checkout` with `status` and `body` instead of an order.
    pub fn set_checkout_reply(&self, status: StatusCode, body: Value) {
        *Self::lock(&self.checkout_reply) = Some((status, body));
    }

    /// Make `route` (e.g. `/orders`) answer `500`.
    pub fn fail(&self, route: &'static str) {
        Self::lock(&self.failing).push(route);
    }

    /// Reject every token from now on, as if the session expired upstream.
    pub fn revoke_tokens(&self) {
        self.tokens_revoked.store(true, Ordering::SeqCst);
    }

    /// `callbackURL` of the last social sign-in request.
    #[must_use]
    pub fn social_callback(&self) -> Option<String> {
        Self::lock(&self.social_callback).clone()
    }

    fn failing(&self, route: &str) -> bool {
        Self::lock(&self.failing).iter().any(|r| *r == route)
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        !self.tokens_revoked.load(Ordering::SeqCst)
            && headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v == format!("Bearer {TEST_TOKEN}"))
    }
}

/// A product as the commerce API reports it.
#[must_use]
pub fn product(id: &str, name: &str, price: i64, stock: u32) -> Value {
    json!({
        "id": id,
        "name": name,
        "slug": name.to_lowercase().replace(' ', "-"),
        "price": price,
        "images": [],
        "stockQuantity": stock,
        "description": format!("{name}, baked this morning."),
    })
}

/// A cart with one line of `quantity` units of `product`.
#[must_use]
pub fn cart_with_line(item_id: &str, product: Value, quantity: u32) -> Value {
    let price = product["price"].as_i64().unwrap_or_default();
    let subtotal = price * i64::from(quantity);
    json!({
        "items": [{
            "id": item_id,
            "quantity": quantity,
            "subTotalPrice": subtotal,
            "product": product,
        }],
        "totalPrice": subtotal,
    })
}

/// A cart holding `quantity` Choco Chunk cookies (line `ci-1`, Rp 25.000 each).
#[must_use]
pub fn choco_cart(stock: u32, quantity: u32) -> Value {
    cart_with_line("ci-1", product("p-1", "Choco Chunk", 25_000, stock), quantity)
}

/// An empty cart.
#[must_use]
pub fn empty_cart() -> Value {
    json!({ "items": [], "totalPrice": 0 })
}

/// An order as the commerce API reports it.
#[must_use]
pub fn order(id: &str, payment_url: Option<&str>) -> Value {
    json!({
        "id": id,
        "items": [{ "name": "Choco Chunk", "quantity": 2, "price": 25_000 }],
        "total": 65_000,
        "status": "PENDING",
        "shippingMethod": "Regular",
        "paymentMethod": "Bank transfer",
        "createdAt": "2026-10-01T08:00:00Z",
        "paymentUrl": payment_url,
    })
}

fn user_json() -> Value {
    json!({ "id": "u-1", "name": TEST_NAME, "email": TEST_EMAIL, "phone": "08123456789" })
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Unauthorized" }))).into_response()
}

fn server_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "message": "database unavailable" })),
    )
        .into_response()
}

async fn sign_in(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.record("POST /sign-in/email");
    if body["email"] == TEST_EMAIL && body["password"] == TEST_PASSWORD {
        Json(json!({ "token": TEST_TOKEN, "user": user_json() })).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid email or password" })),
        )
            .into_response()
    }
}

async fn sign_up(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.record("POST /sign-up/email");
    if body["email"] == TEST_EMAIL {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "message": "Email already registered" })),
        )
            .into_response();
    }
    let user = json!({ "id": "u-2", "name": body["name"], "email": body["email"] });
    Json(json!({ "token": TEST_TOKEN, "user": user })).into_response()
}

async fn sign_in_social(
    State(state): State<Arc<MockState>>,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.record(format!("POST /sign-in/social {}", body["provider"]));
    *MockState::lock(&state.social_callback) = body["callbackURL"].as_str().map(String::from);
    Json(json!({ "url": "https://accounts.example/o/oauth2/auth?client_id=clacie" }))
}

async fn get_session(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Json<Value> {
    state.record("GET /get-session");
    if state.authorized(&headers) {
        Json(json!({ "user": user_json() }))
    } else {
        Json(Value::Null)
    }
}

async fn products() -> Json<Value> {
    Json(json!([
        product("p-1", "Choco Chunk", 25_000, 12),
        product("p-2", "Matcha Oat", 28_000, 0),
    ]))
}

async fn cart(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    Json(MockState::lock(&state.cart).clone()).into_response()
}

async fn add_to_cart(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    state.record(format!("PATCH /cart {body}"));
    Json(json!({})).into_response()
}

async fn clear_cart(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    state.record("DELETE /cart");
    state.set_cart(empty_cart());
    Json(json!({})).into_response()
}

async fn update_cart_item(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    state.record(format!("PATCH /cart/items/{id} {body}"));
    Json(json!({})).into_response()
}

async fn remove_cart_item(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    state.record(format!("DELETE /cart/items/{id}"));
    Json(json!({})).into_response()
}

async fn addresses(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    if state.failing("/address") {
        return server_error();
    }
    Json(json!([])).into_response()
}

async fn checkout(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    state.record(format!("POST /checkout {body}"));
    match MockState::lock(&state.checkout_reply).clone() {
        Some((status, reply)) => (status, Json(reply)).into_response(),
        None => (
            StatusCode::CREATED,
            Json(order(TEST_ORDER_ID, Some("https://pay.example/ord-1"))),
        )
            .into_response(),
    }
}

async fn orders(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    if state.failing("/orders") {
        return server_error();
    }
    Json(json!([order(TEST_ORDER_ID, None)])).into_response()
}

async fn order_detail(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    state.record(format!("GET /orders/{id}"));
    if id == TEST_ORDER_ID {
        Json(order(&id, Some("https://pay.example/ord-1"))).into_response()
    } else {
        (StatusCode::NOT_FOUND, Json(json!({ "message": "Order not found" }))).into_response()
    }
}

async fn shipping_methods() -> Json<Value> {
    Json(json!([
        {
            "id": 1,
            "slug": "regular",
            "name": "Regular",
            "price": 15_000,
            "estimatedDays": "2-3 days",
        },
        { "id": 2, "slug": "express", "name": "Express", "price": 30_000 },
    ]))
}

async fn payment_methods() -> Json<Value> {
    Json(json!([{ "id": 1, "slug": "bank-transfer", "name": "Bank transfer" }]))
}

/// Router answering both the commerce and auth APIs.
pub fn mock_backend(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/sign-in/email", post(sign_in))
        .route("/sign-up/email", post(sign_up))
        .route("/sign-in/social", post(sign_in_social))
        .route("/get-session", get(get_session))
        .route("/products", get(products))
        .route("/cart", get(cart).patch(add_to_cart).delete(clear_cart))
        .route(
            "/cart/items/{id}",
            patch(update_cart_item).delete(remove_cart_item),
        )
        .route("/address", get(addresses))
        .route("/shipping-methods", get(shipping_methods))
        .route("/payment-methods", get(payment_methods))
        .route("/checkout", post(checkout))
        .route("/orders", get(orders))
        .route("/orders/{id}", get(order_detail))
        .with_state(state)
}

async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local address");

    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Test server error");
    });

    addr
}

/// A running storefront wired to a mock backend.
pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub backend: Arc<MockState>,
}

impl TestApp {
    /// Start a backend serving `cart` and a storefront in front of it.
    pub async fn spawn(cart: Value) -> Self {
        let backend = Arc::new(MockState::default());
        backend.set_cart(cart);
        let backend_addr = serve(mock_backend(Arc::clone(&backend))).await;
        let backend_url =
            Url::parse(&format!("http://{backend_addr}/")).expect("Invalid backend URL");

        let config = StorefrontConfig {
            host: Ipv4Addr::LOCALHOST.into(),
            port: 0,
            base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from(TEST_SESSION_SECRET),
            upstream: UpstreamConfig {
                commerce_url: backend_url.clone(),
                auth_url: backend_url,
                timeout: Duration::from_secs(5),
            },
            static_dir: concat!(env!("CARGO_MANIFEST_DIR"), "/../storefront/static").to_string(),
            log_json: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_traces_sample_rate: 0.0,
        };
        let state = AppState::new(config).expect("Failed to build storefront state");
        let addr = serve(build_app(state)).await;

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: format!("http://{addr}"),
            client,
            backend,
        }
    }

    /// Absolute URL for a storefront path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Submit the login form with the given password.
    pub async fn login_with(&self, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/login"))
            .form(&[("email", TEST_EMAIL), ("password", password)])
            .send()
            .await
            .expect("Failed to submit login form")
    }

    /// Sign in as the mock user.
    pub async fn login(&self) {
        let response = self.login_with(TEST_PASSWORD).await;
        assert_eq!(response.status(), reqwest::StatusCode::SEE_OTHER);
    }

    /// Submit a form to a storefront path.
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("Failed to submit form")
    }

    /// `GET` a storefront path.
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send request")
    }
}

/// The `Location` header of a redirect response.
#[must_use]
pub fn location(response: &reqwest::Response) -> Option<&str> {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

/// Whether the response sets a non-empty session cookie.
#[must_use]
pub fn sets_session_cookie(response: &reqwest::Response) -> bool {
    response
        .cookies()
        .any(|cookie| cookie.name() == SESSION_COOKIE && !cookie.value().is_empty())
}
