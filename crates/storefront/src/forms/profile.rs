//! Profile form (name and phone).

use serde::Deserialize;

use super::{FieldErrors, FormSchema, Validator};
use crate::api::{UpdateProfileRequest, User};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    pub name: String,
    pub phone: String,
    /// Page to return to after a plain (non-HTMX) submission.
    pub redirect_to: String,
}

impl From<&User> for ProfileForm {
    fn from(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            phone: user.phone.clone().unwrap_or_default(),
            redirect_to: String::new(),
        }
    }
}

impl FormSchema for UpdateProfileRequest {
    type Form = ProfileForm;

    fn parse(form: &ProfileForm) -> Result<Self, FieldErrors> {
        let mut v = Validator::new();
        let name = v.text("name", "Name", &form.name, 2..=100);
        let phone = v.optional_phone("phone", &form.phone);
        v.finish(|| {
            Some(Self {
                name: name?,
                phone: phone?,
            })
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_is_optional() {
        let form = ProfileForm {
            name: "Budi Santoso".to_string(),
            phone: String::new(),
            redirect_to: String::new(),
        };
        let input = UpdateProfileRequest::parse(&form).unwrap();
        assert_eq!(input.phone, None);
    }

    #[test]
    fn test_invalid_phone() {
        let form = ProfileForm {
            name: "Budi".to_string(),
            phone: "call me".to_string(),
            redirect_to: String::new(),
        };
        let errors = UpdateProfileRequest::parse(&form).unwrap_err();
        assert!(errors.has("phone"));
    }
}
