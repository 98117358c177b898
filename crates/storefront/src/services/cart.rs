//! Cart quantity changes.

use tracing::instrument;

use crate::api::{ApiError, CommerceClient};
use crate::forms::cart::CartQuantityInput;

/// What a quantity submission does to a cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    /// Delete the line.
    Remove,
    /// Set the line to this quantity.
    Update(u32),
}

impl QuantityChange {
    /// Resolve a requested quantity against the product's stock.
    ///
    /// Zero removes the line; anything else is clamped to `1..=stock`. The
    /// backend validates again, this only avoids sending requests it would
    /// reject.
    #[must_use]
    pub fn resolve(requested: u32, stock: u32) -> Self {
        if requested == 0 {
            Self::Remove
        } else {
            Self::Update(requested.clamp(1, stock.max(1)))
        }
    }
}

/// Apply a quantity submission to the user's cart.
///
/// Stock is read from a freshly fetched cart so the clamp uses current data.
///
/// # Errors
///
/// Returns `ApiError::NotFound` if the line is no longer in the cart, or any
/// error from the commerce API.
#[instrument(skip(commerce, token))]
pub async fn apply_quantity(
    commerce: &CommerceClient,
    token: &str,
    input: &CartQuantityInput,
) -> Result<QuantityChange, ApiError> {
    let cart = commerce.cart(token).await?;
    let line = cart
        .item(&input.item_id)
        .ok_or_else(|| ApiError::NotFound(format!("cart item {}", input.item_id)))?;

    let change = QuantityChange::resolve(input.quantity, line.product.stock_quantity);
    match change {
        QuantityChange::Remove => commerce.remove_cart_item(token, &input.item_id).await?,
        QuantityChange::Update(quantity) => {
            if quantity != input.quantity {
                tracing::debug!(
                    requested = input.quantity,
                    clamped = quantity,
                    "Clamped cart quantity to stock"
                );
            }
            commerce
                .update_cart_item(token, &input.item_id, quantity)
                .await?;
        }
    }

    Ok(change)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_removes() {
        assert_eq!(QuantityChange::resolve(0, 10), QuantityChange::Remove);
    }

    #[test]
    fn test_within_stock() {
        assert_eq!(QuantityChange::resolve(3, 10), QuantityChange::Update(3));
    }

    #[test]
    fn test_clamped_to_stock() {
        assert_eq!(QuantityChange::resolve(12, 5), QuantityChange::Update(5));
    }

    #[test]
    fn test_out_of_stock_keeps_one() {
        assert_eq!(QuantityChange::resolve(4, 0), QuantityChange::Update(1));
    }
}
