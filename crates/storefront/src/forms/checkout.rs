//! Checkout form and the shipping/payment selection value object.

use clacie_core::AddressId;
use serde::Deserialize;

use super::{FieldErrors, FormSchema, Validator};
use crate::api::{CheckoutRequest, PaymentMethod, ShippingMethod};

/// Shipping and payment method chosen on the checkout page.
///
/// Parsed from the same form fields by the order summary fragment and by the
/// final submission, so both always agree on the selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CheckoutSelection {
    pub shipping_method: String,
    pub payment_method: String,
}

impl CheckoutSelection {
    /// Fill blank choices with the first available method.
    #[must_use]
    pub fn or_defaults(mut self, shipping: &[ShippingMethod], payment: &[PaymentMethod]) -> Self {
        if self.shipping_method.trim().is_empty() {
            if let Some(method) = shipping.first() {
                self.shipping_method.clone_from(&method.slug);
            }
        }
        if self.payment_method.trim().is_empty() {
            if let Some(method) = payment.first() {
                self.payment_method.clone_from(&method.slug);
            }
        }
        self
    }

    /// Clear choices that are not offered, then fill blanks with defaults.
    ///
    /// Used when re-rendering a rejected order so the summary never prices a
    /// method the backend does not know.
    #[must_use]
    pub fn offered_or_defaults(
        mut self,
        shipping: &[ShippingMethod],
        payment: &[PaymentMethod],
    ) -> Self {
        if self.shipping(shipping).is_none() {
            self.shipping_method.clear();
        }
        if self.payment(payment).is_none() {
            self.payment_method.clear();
        }
        self.or_defaults(shipping, payment)
    }

    /// The selected shipping method, if it is in the list.
    #[must_use]
    pub fn shipping<'a>(&self, methods: &'a [ShippingMethod]) -> Option<&'a ShippingMethod> {
        let slug = self.shipping_method.trim();
        methods.iter().find(|method| method.slug == slug)
    }

    /// The selected payment method, if it is in the list.
    #[must_use]
    pub fn payment<'a>(&self, methods: &'a [PaymentMethod]) -> Option<&'a PaymentMethod> {
        let slug = self.payment_method.trim();
        methods.iter().find(|method| method.slug == slug)
    }
}

/// Raw checkout form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CheckoutForm {
    pub address_id: String,
    pub shipping_method: String,
    pub payment_method: String,
    pub notes: String,
}

impl CheckoutForm {
    /// The method selection as submitted.
    #[must_use]
    pub fn selection(&self) -> CheckoutSelection {
        CheckoutSelection {
            shipping_method: self.shipping_method.clone(),
            payment_method: self.payment_method.clone(),
        }
    }
}

/// A checkout submission that passed the field rules.
///
/// Method slugs are checked against the fetched catalogs separately with
/// [`CheckoutInput::into_request`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutInput {
    pub address_id: AddressId,
    pub selection: CheckoutSelection,
    pub notes: Option<String>,
}

impl FormSchema for CheckoutInput {
    type Form = CheckoutForm;

    fn parse(form: &CheckoutForm) -> Result<Self, FieldErrors> {
        let mut v = Validator::new();
        let address_id = v.id("addressId", "Shipping address", &form.address_id);
        let shipping = v.text(
            "shippingMethod",
            "Shipping method",
            &form.shipping_method,
            1..=64,
        );
        let payment = v.text(
            "paymentMethod",
            "Payment method",
            &form.payment_method,
            1..=64,
        );
        let notes = v.optional_text("notes", "Notes", &form.notes, 500);
        v.finish(|| {
            Some(Self {
                address_id: AddressId::new(address_id?),
                selection: CheckoutSelection {
                    shipping_method: shipping?,
                    payment_method: payment?,
                },
                notes: notes?,
            })
        })
    }
}

impl CheckoutInput {
    /// Build the order request, rejecting methods the backend did not offer.
    ///
    /// # Errors
    ///
    /// Returns field errors for unknown shipping or payment slugs.
    pub fn into_request(
        self,
        shipping: &[ShippingMethod],
        payment: &[PaymentMethod],
    ) -> Result<CheckoutRequest, FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.selection.shipping(shipping).is_none() {
            errors.add("shippingMethod", "Choose a valid shipping method");
        }
        if self.selection.payment(payment).is_none() {
            errors.add("paymentMethod", "Choose a valid payment method");
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(CheckoutRequest {
            address_id: self.address_id,
            shipping_method: self.selection.shipping_method,
            payment_method: self.selection.payment_method,
            notes: self.notes,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use clacie_core::{PaymentMethodId, Price, ShippingMethodId};

    use super::*;

    pub fn shipping_method(slug: &str, price: i64) -> ShippingMethod {
        ShippingMethod {
            id: ShippingMethodId::new(slug),
            slug: slug.to_string(),
            name: slug.to_uppercase(),
            price: Price::from_rupiah(price),
            description: None,
            estimated_days: None,
        }
    }

    pub fn payment_method(slug: &str) -> PaymentMethod {
        PaymentMethod {
            id: PaymentMethodId::new(slug),
            slug: slug.to_string(),
            name: slug.to_uppercase(),
            description: None,
        }
    }

    fn form(address: &str, shipping: &str, payment: &str) -> CheckoutForm {
        CheckoutForm {
            address_id: address.to_string(),
            shipping_method: shipping.to_string(),
            payment_method: payment.to_string(),
            notes: String::new(),
        }
    }

    #[test]
    fn test_or_defaults_picks_first_methods() {
        let selection = CheckoutSelection::default().or_defaults(
            &[shipping_method("regular", 10_000), shipping_method("express", 25_000)],
            &[payment_method("bank-transfer")],
        );
        assert_eq!(selection.shipping_method, "regular");
        assert_eq!(selection.payment_method, "bank-transfer");
    }

    #[test]
    fn test_or_defaults_keeps_explicit_choice() {
        let selection = CheckoutSelection {
            shipping_method: "express".to_string(),
            payment_method: String::new(),
        }
        .or_defaults(&[shipping_method("regular", 10_000)], &[]);
        assert_eq!(selection.shipping_method, "express");
        assert_eq!(selection.payment_method, "");
    }

    #[test]
    fn test_offered_or_defaults_replaces_unknown_method() {
        let selection = CheckoutSelection {
            shipping_method: "teleport".to_string(),
            payment_method: "cod".to_string(),
        }
        .offered_or_defaults(
            &[shipping_method("regular", 10_000)],
            &[payment_method("bank-transfer"), payment_method("cod")],
        );
        assert_eq!(selection.shipping_method, "regular");
        assert_eq!(selection.payment_method, "cod");
    }

    #[test]
    fn test_checkout_requires_all_choices() {
        let errors = CheckoutInput::parse(&form("", "", "")).unwrap_err();
        assert_eq!(errors.message("addressId"), "Shipping address is required");
        assert!(errors.has("shippingMethod"));
        assert!(errors.has("paymentMethod"));
    }

    #[test]
    fn test_into_request_rejects_unknown_method() {
        let input = CheckoutInput::parse(&form("a1", "teleport", "cod")).unwrap();
        let errors = input
            .into_request(&[shipping_method("regular", 10_000)], &[payment_method("cod")])
            .unwrap_err();
        assert_eq!(errors.message("shippingMethod"), "Choose a valid shipping method");
        assert!(!errors.has("paymentMethod"));
    }

    #[test]
    fn test_into_request() {
        let input = CheckoutInput::parse(&form("a1", "regular", "cod")).unwrap();
        let request = input
            .into_request(&[shipping_method("regular", 10_000)], &[payment_method("cod")])
            .unwrap();
        assert_eq!(request.address_id, AddressId::new("a1"));
        assert_eq!(request.notes, None);
    }
}
