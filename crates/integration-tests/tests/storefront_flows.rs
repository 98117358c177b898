//! End-to-end flows through the storefront against the mock backend.

use clacie_integration_tests::{
    TEST_NAME, TestApp, choco_cart, empty_cart, location, sets_session_cookie,
};
use reqwest::StatusCode;

// ============================================================================
// Public pages
// ============================================================================

#[tokio::test]
async fn test_health() {
    let app = TestApp::spawn(empty_cart()).await;
    let resp = app.get("/health").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.expect("body"), "ok");
}

#[tokio::test]
async fn test_home_lists_products_with_security_headers() {
    let app = TestApp::spawn(empty_cart()).await;
    let resp = app.get("/").await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("x-frame-options").and_then(|v| v.to_str().ok()),
        Some("DENY")
    );
    assert!(resp.headers().contains_key("content-security-policy"));
    assert!(resp.headers().contains_key("x-request-id"));

    let body = resp.text().await.expect("body");
    assert!(body.contains("Choco Chunk"));
    assert!(body.contains("Rp 25.000"));
    assert!(body.contains("Sold out"));
}

// ============================================================================
// Auth guard
// ============================================================================

#[tokio::test]
async fn test_protected_pages_redirect_to_login() {
    let app = TestApp::spawn(empty_cart()).await;

    for path in ["/cart", "/checkout", "/dashboard"] {
        let resp = app.get(path).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&resp), Some("/login"), "{path}");
    }
}

#[tokio::test]
async fn test_htmx_action_without_session_gets_hx_redirect() {
    let app = TestApp::spawn(empty_cart()).await;
    let resp = app
        .client
        .post(app.url("/action/user/cart"))
        .header("HX-Request", "true")
        .form(&[("itemId", "ci-1"), ("quantity", "2")])
        .send()
        .await
        .expect("request");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        resp.headers().get("HX-Redirect").and_then(|v| v.to_str().ok()),
        Some("/login")
    );
}

#[tokio::test]
async fn test_rejected_token_signs_out_and_shows_login() {
    let app = TestApp::spawn(empty_cart()).await;
    app.login().await;
    app.get("/").await;
    app.backend.revoke_tokens();

    let resp = app.get("/cart").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some("/login"));

    // The login form renders instead of bouncing a stale session home
    let resp = app.get("/login").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("body");
    assert!(body.contains("Your session has expired. Please sign in again."));
    assert!(!body.contains("Hi, Budi"));

    let resp = app.get("/cart").await;
    assert_eq!(location(&resp), Some("/login"));
}

#[tokio::test]
async fn test_rejected_token_on_htmx_action_signs_out() {
    let app = TestApp::spawn(choco_cart(12, 2)).await;
    app.login().await;
    app.backend.revoke_tokens();

    let resp = app
        .client
        .post(app.url("/action/user/cart"))
        .header("HX-Request", "true")
        .form(&[("itemId", "ci-1"), ("quantity", "3")])
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        resp.headers().get("HX-Redirect").and_then(|v| v.to_str().ok()),
        Some("/login")
    );

    assert_eq!(app.get("/login").await.status(), StatusCode::OK);
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_sets_session_and_shows_toast_once() {
    let app = TestApp::spawn(empty_cart()).await;

    let resp = app.login_with(clacie_integration_tests::TEST_PASSWORD).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some("/"));
    assert!(sets_session_cookie(&resp));

    let first = app.get("/").await.text().await.expect("body");
    assert!(first.contains(&format!("Welcome back, {TEST_NAME}!")));
    assert!(first.contains("Hi, Budi"));

    let second = app.get("/").await.text().await.expect("body");
    assert!(!second.contains("Welcome back"));
    assert!(second.contains("Hi, Budi"));
}

#[tokio::test]
async fn test_invalid_login_shows_error_without_cookie() {
    let app = TestApp::spawn(empty_cart()).await;

    let resp = app.login_with("wrong-password").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(!sets_session_cookie(&resp));

    let body = resp.text().await.expect("body");
    assert!(body.contains("Failed to login. Invalid email or password"));
    // The email is echoed back, the password is not
    assert!(body.contains("budi@example.com"));
    assert!(!body.contains("wrong-password"));
}

#[tokio::test]
async fn test_login_validation_errors_are_per_field() {
    let app = TestApp::spawn(empty_cart()).await;

    let resp = app
        .client
        .post(app.url("/login"))
        .form(&[("email", "not-an-email"), ("password", "")])
        .send()
        .await
        .expect("request");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = resp.text().await.expect("body");
    assert!(body.contains("field-error"));
    assert!(!app.backend.calls().iter().any(|c| c.starts_with("POST /sign-in")));
}

#[tokio::test]
async fn test_logout_clears_session() {
    let app = TestApp::spawn(empty_cart()).await;
    app.login().await;

    let resp = app
        .client
        .post(app.url("/logout"))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some("/"));

    let resp = app.get("/cart").await;
    assert_eq!(location(&resp), Some("/login"));
}

// ============================================================================
// Cart
// ============================================================================

#[tokio::test]
async fn test_quantity_zero_removes_line() {
    let app = TestApp::spawn(choco_cart(12, 2)).await;
    app.login().await;

    let resp = app
        .client
        .post(app.url("/action/user/cart"))
        .form(&[("itemId", "ci-1"), ("quantity", "0")])
        .send()
        .await
        .expect("request");

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some("/cart"));
    assert!(app.backend.calls().contains(&"DELETE /cart/items/ci-1".to_string()));
}

#[tokio::test]
async fn test_quantity_above_stock_is_clamped() {
    let app = TestApp::spawn(choco_cart(5, 2)).await;
    app.login().await;

    let resp = app
        .client
        .post(app.url("/action/user/cart"))
        .header("HX-Request", "true")
        .form(&[("itemId", "ci-1"), ("quantity", "40")])
        .send()
        .await
        .expect("request");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("HX-Trigger").and_then(|v| v.to_str().ok()),
        Some("cart-updated")
    );
    let body = resp.text().await.expect("body");
    assert!(body.contains("id=\"cart-items\""));
    assert!(
        app.backend
            .calls()
            .contains(&r#"PATCH /cart/items/ci-1 {"quantity":5}"#.to_string())
    );
}

#[tokio::test]
async fn test_invalid_quantity_is_rejected_before_backend() {
    let app = TestApp::spawn(choco_cart(5, 2)).await;
    app.login().await;

    let resp = app
        .client
        .post(app.url("/action/user/cart"))
        .header("HX-Request", "true")
        .form(&[("itemId", "ci-1"), ("quantity", "lots")])
        .send()
        .await
        .expect("request");

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.expect("body").contains("form-error"));
    assert!(!app.backend.calls().iter().any(|c| c.contains("/cart/items/")));
}

#[tokio::test]
async fn test_add_to_cart_from_product_page() {
    let app = TestApp::spawn(empty_cart()).await;
    app.login().await;

    let resp = app
        .client
        .post(app.url("/action/user/cart/add"))
        .header("HX-Request", "true")
        .form(&[
            ("productId", "p-1"),
            ("quantity", "2"),
            ("redirectTo", "/products/choco-chunk"),
        ])
        .send()
        .await
        .expect("request");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("HX-Trigger").and_then(|v| v.to_str().ok()),
        Some("cart-updated")
    );
    assert!(resp.text().await.expect("body").contains("Added 2 items to your cart"));
    assert!(app.backend.calls().iter().any(|c| {
        c.starts_with("PATCH /cart {")
            && c.contains(r#""productId":"p-1""#)
            && c.contains(r#""quantity":2"#)
    }));
}

#[tokio::test]
async fn test_add_to_cart_rejects_bad_product_id() {
    let app = TestApp::spawn(empty_cart()).await;
    app.login().await;

    let resp = app
        .post_form(
            "/action/user/cart/add",
            &[("productId", ".."), ("redirectTo", "/products")],
        )
        .await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some("/products"));
    assert!(!app.backend.calls().iter().any(|c| c.starts_with("PATCH /cart")));
}

#[tokio::test]
async fn test_clear_cart() {
    let app = TestApp::spawn(choco_cart(12, 2)).await;
    app.login().await;

    let resp = app.post_form("/action/user/cart/clear", &[]).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some("/cart"));
    assert!(app.backend.calls().contains(&"DELETE /cart".to_string()));

    let body = app.get("/cart").await.text().await.expect("body");
    assert!(body.contains("Your cart is now empty"));
    assert!(body.contains("Your cart is empty"));
}

// ============================================================================
// Checkout
// ============================================================================

#[tokio::test]
async fn test_checkout_with_empty_cart_redirects_to_cart() {
    let app = TestApp::spawn(empty_cart()).await;
    app.login().await;

    let resp = app.get("/checkout").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some("/cart"));

    let body = app.get("/cart").await.text().await.expect("body");
    assert!(body.contains("Your cart is empty"));
}

#[tokio::test]
async fn test_checkout_renders_summary_with_first_methods() {
    let app = TestApp::spawn(choco_cart(12, 2)).await;
    app.login().await;

    let resp = app.get("/checkout").await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = resp.text().await.expect("body");
    // 2 x 25.000 + regular shipping 15.000
    assert!(body.contains("Rp 50.000"));
    assert!(body.contains("Rp 65.000"));
    assert!(body.contains("Pay Now"));
    assert!(body.contains("You have no saved addresses yet"));
}

#[tokio::test]
async fn test_checkout_summary_fragment_follows_selection() {
    let app = TestApp::spawn(choco_cart(12, 2)).await;
    app.login().await;

    let resp = app
        .client
        .get(app.url("/checkout/summary?shippingMethod=express&paymentMethod=bank-transfer"))
        .header("HX-Request", "true")
        .send()
        .await
        .expect("request");

    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("body");
    assert!(body.contains("Express"));
    assert!(body.contains("Rp 80.000"));
    assert!(!body.contains("<html"));
}

// ============================================================================
// Sub-forms and preferences
// ============================================================================

#[tokio::test]
async fn test_htmx_address_validation_returns_fragment() {
    let app = TestApp::spawn(empty_cart()).await;
    app.login().await;

    let resp = app
        .client
        .post(app.url("/action/user/address"))
        .header("HX-Request", "true")
        .form(&[
            ("label", "Home"),
            ("recipientName", "Budi Santoso"),
            ("phone", "08123456789"),
            ("street", "Jl. Kenanga No. 5"),
            ("city", "Jakarta"),
            ("province", "DKI Jakarta"),
            ("postalCode", "12ab"),
            ("redirectTo", "/checkout"),
        ])
        .send()
        .await
        .expect("request");

    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("body");
    assert!(body.contains("id=\"address-form\""));
    assert!(body.contains("Postal code may only contain digits"));
    assert!(body.contains("Jl. Kenanga No. 5"));
}

#[tokio::test]
async fn test_address_with_path_like_id_never_reaches_backend() {
    let app = TestApp::spawn(empty_cart()).await;
    app.login().await;

    let resp = app
        .client
        .post(app.url("/action/user/address"))
        .header("HX-Request", "true")
        .form(&[
            ("id", ".."),
            ("label", "Home"),
            ("recipientName", "Budi Santoso"),
            ("phone", "08123456789"),
            ("street", "Jl. Kenanga No. 5"),
            ("city", "Jakarta"),
            ("province", "DKI Jakarta"),
            ("postalCode", "12150"),
            ("redirectTo", "/dashboard"),
        ])
        .send()
        .await
        .expect("request");

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.expect("body").contains("Choose a valid address"));
    assert!(!app.backend.calls().iter().any(|c| c.contains("/address")));
}

#[tokio::test]
async fn test_theme_toggle_persists() {
    let app = TestApp::spawn(empty_cart()).await;

    let resp = app
        .client
        .post(app.url("/action/theme"))
        .form(&[("redirectTo", "/products")])
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some("/products"));

    let body = app.get("/").await.text().await.expect("body");
    assert!(body.contains("class=\"theme-dark\""));
}

#[tokio::test]
async fn test_theme_toggle_ignores_external_redirect() {
    let app = TestApp::spawn(empty_cart()).await;

    let resp = app
        .client
        .post(app.url("/action/theme"))
        .form(&[("theme", "light"), ("redirectTo", "https://evil.example")])
        .send()
        .await
        .expect("request");
    assert_eq!(location(&resp), Some("/"));
}
