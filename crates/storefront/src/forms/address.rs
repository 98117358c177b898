//! Address form used on checkout and the dashboard.

use clacie_core::AddressId;
use serde::Deserialize;

use super::{FieldErrors, FormSchema, Validator, checkbox};
use crate::api::{Address, AddressInput, AddressLabel};

const DEFAULT_COUNTRY: &str = "Indonesia";

/// Raw address form. `id` is set when editing an existing address.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AddressForm {
    pub id: String,
    pub label: String,
    pub recipient_name: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub country: String,
    pub landmark: String,
    pub notes: String,
    pub latitude: String,
    pub longitude: String,
    pub is_default: String,
    /// Page to return to after a plain (non-HTMX) submission.
    pub redirect_to: String,
}

impl AddressForm {
    /// Form pre-filled from a saved address.
    #[must_use]
    pub fn from_address(address: &Address) -> Self {
        Self {
            id: address.id.to_string(),
            label: address.label.to_string(),
            recipient_name: address.recipient_name.clone(),
            phone: address.phone.clone(),
            street: address.street.clone(),
            city: address.city.clone(),
            province: address.province.clone(),
            postal_code: address.postal_code.clone(),
            country: address.country.clone(),
            landmark: address.landmark.clone().unwrap_or_default(),
            notes: address.notes.clone().unwrap_or_default(),
            latitude: address.latitude.map(|l| l.to_string()).unwrap_or_default(),
            longitude: address.longitude.map(|l| l.to_string()).unwrap_or_default(),
            is_default: if address.is_default { "on" } else { "" }.to_string(),
            redirect_to: String::new(),
        }
    }

    /// Blank form with the defaults shown to the user.
    #[must_use]
    pub fn blank() -> Self {
        Self {
            label: AddressLabel::default().to_string(),
            country: DEFAULT_COUNTRY.to_string(),
            ..Self::default()
        }
    }

    /// Label choices offered in the select.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub const fn label_options(&self) -> &'static [AddressLabel] {
        &AddressLabel::ALL
    }

    #[must_use]
    pub fn is_default_checked(&self) -> bool {
        checkbox(&self.is_default)
    }
}

/// A validated address submission: create when `id` is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct AddressSubmission {
    pub id: Option<AddressId>,
    pub input: AddressInput,
}

impl FormSchema for AddressSubmission {
    type Form = AddressForm;

    fn parse(form: &AddressForm) -> Result<Self, FieldErrors> {
        let mut v = Validator::new();

        let label = v.choice(
            "label",
            "Label",
            &form.label,
            AddressLabel::from_form,
            Some(AddressLabel::default()),
        );
        let recipient_name = v.text(
            "recipientName",
            "Recipient name",
            &form.recipient_name,
            2..=100,
        );
        let phone = v.phone("phone", &form.phone);
        let street = v.text("street", "Street", &form.street, 5..=255);
        let city = v.text("city", "City", &form.city, 2..=100);
        let province = v.text("province", "Province", &form.province, 2..=100);
        let postal_code = v.text("postalCode", "Postal code", &form.postal_code, 4..=10);
        if let Some(code) = &postal_code {
            v.check(
                "postalCode",
                code.chars().all(|c| c.is_ascii_digit()),
                "Postal code may only contain digits",
            );
        }
        let country = form.country.trim();
        let country = if country.is_empty() {
            DEFAULT_COUNTRY.to_string()
        } else {
            country.to_string()
        };
        let landmark = v.optional_text("landmark", "Landmark", &form.landmark, 255);
        let notes = v.optional_text("notes", "Notes", &form.notes, 255);
        let latitude = v.optional_float("latitude", "Latitude", &form.latitude, -90.0..=90.0);
        let longitude = v.optional_float("longitude", "Longitude", &form.longitude, -180.0..=180.0);

        let id = v.optional_id("id", "Address", &form.id);

        v.finish(|| {
            Some(Self {
                id: id?.map(AddressId::new),
                input: AddressInput {
                    label: label?,
                    recipient_name: recipient_name?,
                    phone: phone?,
                    street: street?,
                    city: city?,
                    province: province?,
                    postal_code: postal_code?,
                    country,
                    landmark: landmark?,
                    notes: notes?,
                    latitude: latitude?,
                    longitude: longitude?,
                    is_default: checkbox(&form.is_default),
                },
            })
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_form() -> AddressForm {
        AddressForm {
            recipient_name: "Sari Dewi".to_string(),
            phone: "081234567890".to_string(),
            street: "Jl. Kemang Raya No. 5".to_string(),
            city: "Jakarta Selatan".to_string(),
            province: "DKI Jakarta".to_string(),
            postal_code: "12730".to_string(),
            ..AddressForm::default()
        }
    }

    #[test]
    fn test_defaults_applied() {
        let submission = AddressSubmission::parse(&valid_form()).unwrap();
        assert_eq!(submission.id, None);
        assert_eq!(submission.input.label, AddressLabel::Home);
        assert_eq!(submission.input.country, "Indonesia");
        assert!(!submission.input.is_default);
        assert_eq!(submission.input.latitude, None);
    }

    #[test]
    fn test_edit_with_coordinates() {
        let form = AddressForm {
            id: "7".to_string(),
            label: "Office".to_string(),
            latitude: "-6.2607".to_string(),
            longitude: "106.8137".to_string(),
            is_default: "on".to_string(),
            ..valid_form()
        };
        let submission = AddressSubmission::parse(&form).unwrap();
        assert_eq!(submission.id, Some(AddressId::new("7")));
        assert_eq!(submission.input.label, AddressLabel::Office);
        assert_eq!(submission.input.longitude, Some(106.8137));
        assert!(submission.input.is_default);
    }

    #[test]
    fn test_edit_rejects_path_like_id() {
        let form = AddressForm {
            id: "..".to_string(),
            ..valid_form()
        };
        let errors = AddressSubmission::parse(&form).unwrap_err();
        assert_eq!(errors.message("id"), "Choose a valid address");
    }

    #[test]
    fn test_field_errors() {
        let form = AddressForm {
            label: "Warehouse".to_string(),
            postal_code: "12A30".to_string(),
            street: "Jl.".to_string(),
            longitude: "200".to_string(),
            ..valid_form()
        };
        let errors = AddressSubmission::parse(&form).unwrap_err();
        assert!(errors.has("label"));
        assert_eq!(errors.message("postalCode"), "Postal code may only contain digits");
        assert_eq!(errors.message("street"), "Street must be at least 5 characters");
        assert!(errors.has("longitude"));
        assert!(!errors.has("city"));
    }
}
