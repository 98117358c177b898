//! Cart forms: quantity edits and add-to-cart.

use clacie_core::{CartItemId, ProductId};
use serde::Deserialize;

use super::{FieldErrors, FormSchema, Validator};

/// Largest quantity accepted for a single line.
pub const MAX_QUANTITY: u32 = 999;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CartQuantityForm {
    pub item_id: String,
    pub quantity: String,
}

/// A requested quantity for one cart line. Zero removes the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartQuantityInput {
    pub item_id: CartItemId,
    pub quantity: u32,
}

impl FormSchema for CartQuantityInput {
    type Form = CartQuantityForm;

    fn parse(form: &CartQuantityForm) -> Result<Self, FieldErrors> {
        let mut v = Validator::new();
        let item_id = v.id("itemId", "Cart item", &form.item_id);
        let quantity = v.integer("quantity", "Quantity", &form.quantity, 0..=MAX_QUANTITY);
        v.finish(|| {
            Some(Self {
                item_id: CartItemId::new(item_id?),
                quantity: quantity?,
            })
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AddToCartForm {
    pub product_id: String,
    pub quantity: String,
    /// Page to return to when the submission is rejected.
    pub redirect_to: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddToCartInput {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl FormSchema for AddToCartInput {
    type Form = AddToCartForm;

    fn parse(form: &AddToCartForm) -> Result<Self, FieldErrors> {
        let mut v = Validator::new();
        let product_id = v.id("productId", "Product", &form.product_id);
        let quantity = if form.quantity.trim().is_empty() {
            Some(1)
        } else {
            v.integer("quantity", "Quantity", &form.quantity, 1..=MAX_QUANTITY)
        };
        v.finish(|| {
            Some(Self {
                product_id: ProductId::new(product_id?),
                quantity: quantity?,
            })
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_zero_is_valid() {
        let form = CartQuantityForm {
            item_id: "11".to_string(),
            quantity: "0".to_string(),
        };
        let input = CartQuantityInput::parse(&form).unwrap();
        assert_eq!(input.quantity, 0);
        assert_eq!(input.item_id, CartItemId::new("11"));
    }

    #[test]
    fn test_quantity_out_of_range() {
        let form = CartQuantityForm {
            item_id: "11".to_string(),
            quantity: "1000".to_string(),
        };
        let errors = CartQuantityInput::parse(&form).unwrap_err();
        assert_eq!(errors.message("quantity"), "Quantity must be between 0 and 999");
    }

    #[test]
    fn test_add_defaults_to_one() {
        let form = AddToCartForm {
            product_id: "p1".to_string(),
            quantity: String::new(),
            redirect_to: "/products/choco-chip".to_string(),
        };
        assert_eq!(AddToCartInput::parse(&form).unwrap().quantity, 1);
    }
}
