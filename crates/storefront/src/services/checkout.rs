//! Checkout page assembly and order summary.
//!
//! The checkout page needs five independent pieces of backend data. They are
//! fetched concurrently and then classified: the cart and the profile are
//! required, the method catalogs are required, saved addresses are optional.

use clacie_core::{AddressId, Price};
use tracing::instrument;

use crate::api::{
    Address, ApiError, AuthClient, Cart, CommerceClient, PaymentMethod, ShippingMethod, User,
};
use crate::forms::checkout::CheckoutSelection;

/// Shipping cost shown when the selected method is not in the fetched list.
pub const FALLBACK_SHIPPING_COST: i64 = 15_000;

/// Totals shown next to the checkout form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSummary {
    pub item_count: u32,
    pub subtotal: Price,
    pub shipping_cost: Price,
    pub total: Price,
    /// The selected shipping method was unknown and the fallback cost was used.
    pub shipping_fallback: bool,
    pub shipping_name: Option<String>,
    pub payment_name: Option<String>,
}

/// Compute the order summary for a selection.
///
/// `total = cart.total_price + shipping_cost`. The cart total comes from the
/// backend and is not recomputed here.
#[must_use]
pub fn summarize(
    cart: &Cart,
    shipping: &[ShippingMethod],
    payment: &[PaymentMethod],
    selection: &CheckoutSelection,
) -> OrderSummary {
    let method = selection.shipping(shipping);
    let shipping_cost = method.map_or_else(
        || {
            tracing::warn!(
                shipping_method = %selection.shipping_method,
                "Selected shipping method not offered, using fallback cost"
            );
            Price::from_rupiah(FALLBACK_SHIPPING_COST)
        },
        |method| method.price,
    );

    OrderSummary {
        item_count: cart.item_count(),
        subtotal: cart.total_price,
        shipping_cost,
        total: cart.total_price + shipping_cost,
        shipping_fallback: method.is_none(),
        shipping_name: method.map(|m| m.name.clone()),
        payment_name: selection.payment(payment).map(|m| m.name.clone()),
    }
}

/// Everything the checkout page renders.
#[derive(Debug, Clone)]
pub struct CheckoutData {
    pub profile: User,
    pub cart: Cart,
    pub addresses: Vec<Address>,
    /// Saved addresses could not be loaded; the page shows a notice.
    pub addresses_unavailable: bool,
    pub shipping: Vec<ShippingMethod>,
    pub payment: Vec<PaymentMethod>,
}

impl CheckoutData {
    /// Address preselected in the picker: the default one, else the first.
    #[must_use]
    pub fn preselected_address(&self) -> Option<&AddressId> {
        self.addresses
            .iter()
            .find(|address| address.is_default)
            .or_else(|| self.addresses.first())
            .map(|address| &address.id)
    }
}

/// Where to send the browser when the checkout page cannot be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutRedirect {
    /// Cart failed to load or is empty.
    Cart,
    /// Profile failed to load (usually an expired token).
    Login,
    /// Shipping or payment catalog failed to load.
    Home,
}

impl CheckoutRedirect {
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Cart => "/cart",
            Self::Login => "/login",
            Self::Home => "/",
        }
    }

    /// Toast to show after redirecting.
    #[must_use]
    pub const fn toast(self) -> Option<&'static str> {
        match self {
            Self::Cart => None,
            Self::Login => Some("Please sign in again to continue checkout"),
            Self::Home => Some("Checkout is unavailable right now. Please try again later."),
        }
    }
}

/// Classify the five fetch results.
///
/// Precedence: cart, then profile, then method catalogs. Address failures
/// never redirect.
///
/// # Errors
///
/// Returns the redirect to issue when required data is missing.
pub fn assemble(
    profile: Result<User, ApiError>,
    cart: Result<Cart, ApiError>,
    addresses: Result<Vec<Address>, ApiError>,
    shipping: Result<Vec<ShippingMethod>, ApiError>,
    payment: Result<Vec<PaymentMethod>, ApiError>,
) -> Result<CheckoutData, CheckoutRedirect> {
    let cart = match cart {
        Ok(cart) if !cart.is_empty() => cart,
        Ok(_) => return Err(CheckoutRedirect::Cart),
        Err(e) => {
            tracing::warn!("Checkout: failed to load cart: {e}");
            return Err(CheckoutRedirect::Cart);
        }
    };

    let profile = profile.map_err(|e| {
        tracing::warn!("Checkout: failed to load profile: {e}");
        CheckoutRedirect::Login
    })?;

    let (shipping, payment) = match (shipping, payment) {
        (Ok(shipping), Ok(payment)) => (shipping, payment),
        (Err(e), _) | (_, Err(e)) => {
            tracing::error!("Checkout: failed to load shipping or payment methods: {e}");
            return Err(CheckoutRedirect::Home);
        }
    };

    let (addresses, addresses_unavailable) = match addresses {
        Ok(addresses) => (addresses, false),
        Err(e) => {
            tracing::warn!("Checkout: failed to load addresses: {e}");
            (Vec::new(), true)
        }
    };

    Ok(CheckoutData {
        profile,
        cart,
        addresses,
        addresses_unavailable,
        shipping,
        payment,
    })
}

/// Fetch and classify everything the checkout page needs.
///
/// # Errors
///
/// Returns the redirect to issue when required data is missing.
#[instrument(skip(auth, commerce, token))]
pub async fn load(
    auth: &AuthClient,
    commerce: &CommerceClient,
    token: &str,
) -> Result<CheckoutData, CheckoutRedirect> {
    let (profile, cart, addresses, shipping, payment) = tokio::join!(
        auth.profile(token),
        commerce.cart(token),
        commerce.addresses(token),
        commerce.shipping_methods(token),
        commerce.payment_methods(token),
    );

    assemble(profile, cart, addresses, shipping, payment)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clacie_core::{CartItemId, Email, ProductId, UserId};

    use super::*;
    use crate::api::{CartItem, Product};
    use crate::forms::checkout::tests::{payment_method, shipping_method};

    fn cart(total: i64) -> Cart {
        Cart {
            items: vec![CartItem {
                id: CartItemId::new("1"),
                quantity: 2,
                sub_total_price: Price::from_rupiah(total),
                product: Product {
                    id: ProductId::new("p1"),
                    name: "Choco Chip".to_string(),
                    slug: "choco-chip".to_string(),
                    price: Price::from_rupiah(total / 2),
                    images: Vec::new(),
                    stock_quantity: 10,
                    description: None,
                },
            }],
            total_price: Price::from_rupiah(total),
        }
    }

    fn user() -> User {
        User {
            id: UserId::new("u1"),
            name: "Sari".to_string(),
            email: Email::parse("sari@clacie.id").unwrap(),
            phone: None,
            image: None,
        }
    }

    fn selection(shipping: &str) -> CheckoutSelection {
        CheckoutSelection {
            shipping_method: shipping.to_string(),
            payment_method: "cod".to_string(),
        }
    }

    fn upstream_down() -> ApiError {
        ApiError::Api {
            status: 503,
            message: "unavailable".to_string(),
        }
    }

    #[test]
    fn test_summary_with_known_method() {
        let summary = summarize(
            &cart(50_000),
            &[shipping_method("regular", 10_000)],
            &[payment_method("cod")],
            &selection("regular"),
        );
        assert_eq!(summary.shipping_cost, Price::from_rupiah(10_000));
        assert_eq!(summary.total, Price::from_rupiah(60_000));
        assert!(!summary.shipping_fallback);
        assert_eq!(summary.payment_name.as_deref(), Some("COD"));
        assert_eq!(summary.item_count, 2);
    }

    #[test]
    fn test_summary_falls_back_for_unknown_method() {
        let summary = summarize(
            &cart(50_000),
            &[shipping_method("regular", 10_000)],
            &[],
            &selection("same-day"),
        );
        assert_eq!(summary.shipping_cost, Price::from_rupiah(FALLBACK_SHIPPING_COST));
        assert_eq!(summary.total, Price::from_rupiah(65_000));
        assert!(summary.shipping_fallback);
        assert_eq!(summary.shipping_name, None);
    }

    #[test]
    fn test_empty_cart_wins_over_other_failures() {
        let result = assemble(
            Err(ApiError::Unauthorized),
            Ok(Cart::default()),
            Err(upstream_down()),
            Err(upstream_down()),
            Err(upstream_down()),
        );
        assert_eq!(result.unwrap_err(), CheckoutRedirect::Cart);
    }

    #[test]
    fn test_cart_error_redirects_to_cart() {
        let result = assemble(Ok(user()), Err(upstream_down()), Ok(vec![]), Ok(vec![]), Ok(vec![]));
        assert_eq!(result.unwrap_err(), CheckoutRedirect::Cart);
    }

    #[test]
    fn test_profile_error_redirects_to_login() {
        let result = assemble(
            Err(ApiError::Unauthorized),
            Ok(cart(10_000)),
            Ok(vec![]),
            Err(upstream_down()),
            Ok(vec![]),
        );
        assert_eq!(result.unwrap_err(), CheckoutRedirect::Login);
    }

    #[test]
    fn test_method_error_redirects_home() {
        let result = assemble(
            Ok(user()),
            Ok(cart(10_000)),
            Ok(vec![]),
            Ok(vec![shipping_method("regular", 10_000)]),
            Err(upstream_down()),
        );
        let redirect = result.unwrap_err();
        assert_eq!(redirect, CheckoutRedirect::Home);
        assert!(redirect.toast().is_some());
    }

    #[test]
    fn test_addresses_are_optional() {
        let data = assemble(
            Ok(user()),
            Ok(cart(10_000)),
            Err(upstream_down()),
            Ok(vec![shipping_method("regular", 10_000)]),
            Ok(vec![payment_method("cod")]),
        )
        .unwrap();
        assert!(data.addresses_unavailable);
        assert!(data.addresses.is_empty());
        assert_eq!(data.preselected_address(), None);
    }
}
