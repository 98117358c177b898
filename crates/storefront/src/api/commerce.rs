//! Commerce API: catalog, cart, addresses, checkout and orders.

use clacie_core::{AddressId, CartItemId, OrderId, ProductId};
use serde::de::IgnoredAny;
use tracing::instrument;

use super::types::{
    AddCartItemRequest, Address, AddressInput, Cart, CheckoutRequest, Order, PaymentMethod,
    Product, ShippingMethod, UpdateCartItemRequest,
};
use super::{ApiClient, ApiError};

/// Client for the commerce backend.
///
/// Catalog endpoints are public; everything else needs the session token.
#[derive(Clone)]
pub struct CommerceClient {
    api: ApiClient,
}

impl CommerceClient {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// List all products.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Vec<Product>, ApiError> {
        self.api.get("/products", None).await
    }

    /// Get a product by slug or ID.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if no product matches.
    #[instrument(skip(self))]
    pub async fn product(&self, identifier: &str) -> Result<Product, ApiError> {
        let path = format!("/products/{}", urlencoding::encode(identifier));
        self.api.get(&path, None).await
    }

    /// Full-text product search.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<Product>, ApiError> {
        let path = format!("/search?q={}", urlencoding::encode(query));
        self.api.get(&path, None).await
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Get the signed-in user's cart.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn cart(&self, token: &str) -> Result<Cart, ApiError> {
        self.api.get("/cart", Some(token)).await
    }

    /// Add a product to the cart (`PATCH /cart`).
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn add_to_cart(
        &self,
        token: &str,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        let body = AddCartItemRequest {
            product_id,
            quantity,
        };
        let _: IgnoredAny = self.api.patch("/cart", &body, Some(token)).await?;
        Ok(())
    }

    /// Remove every line from the cart.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn clear_cart(&self, token: &str) -> Result<(), ApiError> {
        let _: IgnoredAny = self.api.delete("/cart", Some(token)).await?;
        Ok(())
    }

    /// Set the quantity of one cart line.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn update_cart_item(
        &self,
        token: &str,
        item_id: &CartItemId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        let path = format!("/cart/items/{}", urlencoding::encode(item_id.as_str()));
        let body = UpdateCartItemRequest { quantity };
        let _: IgnoredAny = self.api.patch(&path, &body, Some(token)).await?;
        Ok(())
    }

    /// Delete one cart line.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn remove_cart_item(
        &self,
        token: &str,
        item_id: &CartItemId,
    ) -> Result<(), ApiError> {
        let path = format!("/cart/items/{}", urlencoding::encode(item_id.as_str()));
        let _: IgnoredAny = self.api.delete(&path, Some(token)).await?;
        Ok(())
    }

    // =========================================================================
    // Addresses
    // =========================================================================

    /// List saved addresses.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn addresses(&self, token: &str) -> Result<Vec<Address>, ApiError> {
        self.api.get("/address", Some(token)).await
    }

    /// Create an address.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self, token, input))]
    pub async fn create_address(&self, token: &str, input: &AddressInput) -> Result<(), ApiError> {
        let _: IgnoredAny = self.api.post("/address", input, Some(token)).await?;
        Ok(())
    }

    /// Update an existing address.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self, token, input))]
    pub async fn update_address(
        &self,
        token: &str,
        id: &AddressId,
        input: &AddressInput,
    ) -> Result<(), ApiError> {
        let path = format!("/address/{}", urlencoding::encode(id.as_str()));
        let _: IgnoredAny = self.api.patch(&path, input, Some(token)).await?;
        Ok(())
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Available shipping methods.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn shipping_methods(&self, token: &str) -> Result<Vec<ShippingMethod>, ApiError> {
        self.api.get("/shipping-methods", Some(token)).await
    }

    /// Available payment methods.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn payment_methods(&self, token: &str) -> Result<Vec<PaymentMethod>, ApiError> {
        self.api.get("/payment-methods", Some(token)).await
    }

    /// Place an order from the current cart.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn checkout(
        &self,
        token: &str,
        request: &CheckoutRequest,
    ) -> Result<Order, ApiError> {
        self.api.post("/checkout", request, Some(token)).await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Order history, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn orders(&self, token: &str) -> Result<Vec<Order>, ApiError> {
        self.api.get("/orders", Some(token)).await
    }

    /// One order.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the order does not exist for this user.
    #[instrument(skip(self, token))]
    pub async fn order(&self, token: &str, id: &OrderId) -> Result<Order, ApiError> {
        let path = format!("/orders/{}", urlencoding::encode(id.as_str()));
        self.api.get(&path, Some(token)).await
    }
}
