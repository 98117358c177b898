//! Login and registration forms.

use clacie_core::Email;
use serde::Deserialize;

use super::{FieldErrors, FormSchema, Validator};

/// Raw login form. Not `Debug`: it carries a password.
#[derive(Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Validated login credentials.
pub struct LoginInput {
    pub email: Email,
    pub password: String,
}

impl FormSchema for LoginInput {
    type Form = LoginForm;

    fn parse(form: &LoginForm) -> Result<Self, FieldErrors> {
        let mut v = Validator::new();
        let email = v.email("email", &form.email);
        let password = v.secret("password", "Password", &form.password, 1..=128);
        v.finish(|| {
            Some(Self {
                email: email?,
                password: password?,
            })
        })
    }
}

/// Raw registration form.
#[derive(Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Validated registration details.
pub struct RegisterInput {
    pub name: String,
    pub email: Email,
    pub password: String,
}

impl FormSchema for RegisterInput {
    type Form = RegisterForm;

    fn parse(form: &RegisterForm) -> Result<Self, FieldErrors> {
        let mut v = Validator::new();
        let name = v.text("name", "Name", &form.name, 2..=100);
        let email = v.email("email", &form.email);
        let password = v.secret("password", "Password", &form.password, 8..=128);
        v.finish(|| {
            Some(Self {
                name: name?,
                email: email?,
                password: password?,
            })
        })
    }
}
