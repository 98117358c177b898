//! Form parsing and validation.
//!
//! Every form goes through two steps:
//!
//! 1. The urlencoded body is deserialized leniently into a raw struct of
//!    strings (missing fields become empty), so a bad value never turns into
//!    an opaque `422`.
//! 2. A [`FormSchema`] turns the raw struct into a typed value, or into
//!    [`FieldErrors`] that templates render next to each input.
//!
//! Handlers take a [`Submission<T>`] and get both the raw form (to re-fill
//! inputs) and the validation result.

pub mod address;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod profile;

use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::sync::LazyLock;

use axum::{
    Form,
    extract::{FromRequest, Request, rejection::FormRejection},
};
use clacie_core::{Email, EmailError};
use regex::Regex;
use serde::de::DeserializeOwned;

/// Phone numbers: optional leading `+`, then digits, spaces and dashes.
static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9][0-9 \-]*[0-9]$").expect("Invalid regex"));

/// Longest backend resource ID accepted from a form or path.
pub const MAX_RESOURCE_ID_LEN: usize = 64;

/// Field-level validation errors plus an optional form-level error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    fields: BTreeMap<&'static str, String>,
    form: Option<String>,
}

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Errors consisting only of a form-level message.
    #[must_use]
    pub fn form(message: impl Into<String>) -> Self {
        Self {
            fields: BTreeMap::new(),
            form: Some(message.into()),
        }
    }

    /// Record an error for `field`. The first error per field wins.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_insert_with(|| message.into());
    }

    pub fn set_form_error(&mut self, message: impl Into<String>) {
        self.form = Some(message.into());
    }

    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Error message for `field`, or an empty string.
    #[must_use]
    pub fn message(&self, field: &str) -> &str {
        self.fields.get(field).map_or("", String::as_str)
    }

    #[must_use]
    pub fn form_error(&self) -> Option<&str> {
        self.form.as_deref()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.form.is_none()
    }

    /// The form-level error, else the first field error.
    #[must_use]
    pub fn first_message(&self) -> Option<&str> {
        self.form_error()
            .or_else(|| self.fields.values().next().map(String::as_str))
    }

    /// Fields with errors, in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.fields.iter().map(|(field, message)| (*field, message.as_str()))
    }
}

/// A typed value that can be validated out of a raw form.
pub trait FormSchema: Sized {
    /// Lenient raw representation of the submitted form.
    type Form: DeserializeOwned + Default + Send;

    /// Validate the raw form.
    ///
    /// # Errors
    ///
    /// Returns the per-field errors if any rule fails.
    fn parse(form: &Self::Form) -> Result<Self, FieldErrors>;
}

/// A submitted form together with its validation result.
pub struct Submission<T: FormSchema> {
    pub form: T::Form,
    pub result: Result<T, FieldErrors>,
}

impl<S, T> FromRequest<S> for Submission<T>
where
    S: Send + Sync,
    T: FormSchema,
{
    type Rejection = FormRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Form(form) = Form::<T::Form>::from_request(req, state).await?;
        let result = T::parse(&form);
        Ok(Self { form, result })
    }
}

/// Accumulates field errors while individual values are checked.
///
/// Each check returns `Some(value)` on success so the final struct can be
/// assembled with `?` inside [`Validator::finish`].
#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error when `ok` is false.
    pub fn check(&mut self, field: &'static str, ok: bool, message: impl Into<String>) {
        if !ok {
            self.errors.add(field, message);
        }
    }

    /// Required text, trimmed, with a character count range.
    pub fn text(
        &mut self,
        field: &'static str,
        label: &str,
        value: &str,
        len: RangeInclusive<usize>,
    ) -> Option<String> {
        let value = value.trim();
        if value.is_empty() {
            self.errors.add(field, format!("{label} is required"));
            return None;
        }
        self.length(field, label, value, &len).then(|| value.to_string())
    }

    /// Required backend resource ID, placed into API paths.
    pub fn id(&mut self, field: &'static str, label: &str, value: &str) -> Option<String> {
        let value = value.trim();
        if value.is_empty() {
            self.errors.add(field, format!("{label} is required"));
            return None;
        }
        if !is_resource_id(value) {
            self.errors.add(field, format!("Choose a valid {}", label.to_lowercase()));
            return None;
        }
        Some(value.to_string())
    }

    /// Optional resource ID: blank becomes `None`.
    pub fn optional_id(
        &mut self,
        field: &'static str,
        label: &str,
        value: &str,
    ) -> Option<Option<String>> {
        if value.trim().is_empty() {
            return Some(None);
        }
        self.id(field, label, value).map(Some)
    }

    /// Required secret (not trimmed).
    pub fn secret(
        &mut self,
        field: &'static str,
        label: &str,
        value: &str,
        len: RangeInclusive<usize>,
    ) -> Option<String> {
        if value.is_empty() {
            self.errors.add(field, format!("{label} is required"));
            return None;
        }
        self.length(field, label, value, &len).then(|| value.to_string())
    }

    /// Optional text: blank becomes `None`.
    ///
    /// Returns `None` only when the value is present but too long.
    pub fn optional_text(
        &mut self,
        field: &'static str,
        label: &str,
        value: &str,
        max: usize,
    ) -> Option<Option<String>> {
        let value = value.trim();
        if value.is_empty() {
            return Some(None);
        }
        self.length(field, label, value, &(0..=max))
            .then(|| Some(value.to_string()))
    }

    pub fn email(&mut self, field: &'static str, value: &str) -> Option<Email> {
        match Email::parse(value) {
            Ok(email) => Some(email),
            Err(EmailError::Empty) => {
                self.errors.add(field, "Email is required");
                None
            }
            Err(_) => {
                self.errors.add(field, "Enter a valid email address");
                None
            }
        }
    }

    /// Required phone number, 8 to 20 characters.
    pub fn phone(&mut self, field: &'static str, value: &str) -> Option<String> {
        let phone = self.text(field, "Phone number", value, 8..=20)?;
        self.matches_phone(field, phone)
    }

    /// Optional phone number.
    pub fn optional_phone(&mut self, field: &'static str, value: &str) -> Option<Option<String>> {
        if value.trim().is_empty() {
            return Some(None);
        }
        self.phone(field, value).map(Some)
    }

    /// Value restricted to a fixed set, with a default for blank input.
    pub fn choice<T>(
        &mut self,
        field: &'static str,
        label: &str,
        value: &str,
        parse: impl Fn(&str) -> Option<T>,
        default: Option<T>,
    ) -> Option<T> {
        let value = value.trim();
        if value.is_empty() {
            if default.is_none() {
                self.errors.add(field, format!("{label} is required"));
            }
            return default;
        }
        let parsed = parse(value);
        if parsed.is_none() {
            self.errors.add(field, format!("Choose a valid {}", label.to_lowercase()));
        }
        parsed
    }

    /// Whole number within `range`.
    pub fn integer(
        &mut self,
        field: &'static str,
        label: &str,
        value: &str,
        range: RangeInclusive<u32>,
    ) -> Option<u32> {
        let value = value.trim();
        if value.is_empty() {
            self.errors.add(field, format!("{label} is required"));
            return None;
        }
        match value.parse::<u32>() {
            Ok(n) if range.contains(&n) => Some(n),
            Ok(_) => {
                self.errors.add(
                    field,
                    format!(
                        "{label} must be between {} and {}",
                        range.start(),
                        range.end()
                    ),
                );
                None
            }
            Err(_) => {
                self.errors.add(field, format!("{label} must be a whole number"));
                None
            }
        }
    }

    /// Optional decimal number within `range`.
    pub fn optional_float(
        &mut self,
        field: &'static str,
        label: &str,
        value: &str,
        range: RangeInclusive<f64>,
    ) -> Option<Option<f64>> {
        let value = value.trim();
        if value.is_empty() {
            return Some(None);
        }
        match value.parse::<f64>() {
            Ok(n) if range.contains(&n) => Some(Some(n)),
            Ok(_) => {
                self.errors.add(
                    field,
                    format!(
                        "{label} must be between {} and {}",
                        range.start(),
                        range.end()
                    ),
                );
                None
            }
            Err(_) => {
                self.errors.add(field, format!("{label} must be a number"));
                None
            }
        }
    }

    /// Finish validation.
    ///
    /// # Errors
    ///
    /// Returns the accumulated errors if any check failed.
    pub fn finish<T>(self, build: impl FnOnce() -> Option<T>) -> Result<T, FieldErrors> {
        if !self.errors.is_empty() {
            return Err(self.errors);
        }
        build().ok_or_else(|| FieldErrors::form("Invalid form submission"))
    }

    fn length(
        &mut self,
        field: &'static str,
        label: &str,
        value: &str,
        len: &RangeInclusive<usize>,
    ) -> bool {
        let count = value.chars().count();
        if count < *len.start() {
            self.errors.add(
                field,
                format!("{label} must be at least {} characters", len.start()),
            );
            false
        } else if count > *len.end() {
            self.errors.add(
                field,
                format!("{label} must be at most {} characters", len.end()),
            );
            false
        } else {
            true
        }
    }

    fn matches_phone(&mut self, field: &'static str, phone: String) -> Option<String> {
        if PHONE_PATTERN.is_match(&phone) {
            Some(phone)
        } else {
            self.errors.add(
                field,
                "Phone number may only contain digits, spaces, dashes and a leading +",
            );
            None
        }
    }
}

/// Checkbox inputs submit `on` when ticked and nothing otherwise.
#[must_use]
pub fn checkbox(value: &str) -> bool {
    matches!(value.trim(), "on" | "true" | "1")
}

/// Whether `value` can be used as one path segment of a backend URL.
///
/// IDs are 1 to 64 characters of `[A-Za-z0-9_-]`, which also rules out the
/// `.` and `..` segments.
#[must_use]
pub fn is_resource_id(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_RESOURCE_ID_LEN
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Accept a redirect target only if it stays on this site.
#[must_use]
pub fn local_redirect_target(value: &str) -> Option<&str> {
    let is_local = value.starts_with('/') && !value.starts_with("//") && !value.contains('\\');
    is_local.then_some(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_first_error_wins() {
        let mut errors = FieldErrors::new();
        errors.add("name", "Name is required");
        errors.add("name", "Name must be at least 2 characters");
        assert_eq!(errors.message("name"), "Name is required");
        assert_eq!(errors.message("email"), "");
        assert!(errors.has("name"));
        assert_eq!(errors.first_message(), Some("Name is required"));

        errors.set_form_error("Try again");
        assert_eq!(errors.first_message(), Some("Try again"));
    }

    #[test]
    fn test_text_trims_and_checks_length() {
        let mut v = Validator::new();
        assert_eq!(v.text("name", "Name", "  Sari  ", 2..=100).as_deref(), Some("Sari"));
        assert!(v.text("city", "City", "X", 2..=100).is_none());
        let errors = v.finish(|| Some(())).unwrap_err();
        assert_eq!(errors.message("city"), "City must be at least 2 characters");
    }

    #[test]
    fn test_text_counts_characters_not_bytes() {
        let mut v = Validator::new();
        assert!(v.text("name", "Name", "Éé", 2..=2).is_some());
    }

    #[test]
    fn test_optional_text() {
        let mut v = Validator::new();
        assert_eq!(v.optional_text("notes", "Notes", "   ", 10), Some(None));
        assert_eq!(
            v.optional_text("notes", "Notes", "ring bell", 10),
            Some(Some("ring bell".to_string()))
        );
        assert_eq!(v.optional_text("notes", "Notes", "x".repeat(11).as_str(), 10), None);
    }

    #[test]
    fn test_phone_rules() {
        let mut v = Validator::new();
        assert!(v.phone("phone", "+62 812-3456-7890").is_some());
        assert!(v.phone("a", "0812").is_none());
        assert!(v.phone("b", "0812abcd5678").is_none());
        assert_eq!(v.optional_phone("c", ""), Some(None));
    }

    #[test]
    fn test_choice_default_and_invalid() {
        let mut v = Validator::new();
        let parse = |s: &str| (s == "a" || s == "b").then(|| s.to_string());
        assert_eq!(v.choice("x", "Label", "", parse, Some("a".to_string())).as_deref(), Some("a"));
        assert_eq!(v.choice("y", "Label", "c", parse, None), None);
        assert_eq!(v.choice("z", "Label", "", parse, None), None);
        let errors = v.finish(|| Some(())).unwrap_err();
        assert_eq!(errors.message("y"), "Choose a valid label");
        assert_eq!(errors.message("z"), "Label is required");
    }

    #[test]
    fn test_integer_bounds() {
        let mut v = Validator::new();
        assert_eq!(v.integer("q", "Quantity", "0", 0..=999), Some(0));
        assert_eq!(v.integer("q2", "Quantity", "1000", 0..=999), None);
        assert_eq!(v.integer("q3", "Quantity", "-1", 0..=999), None);
        assert_eq!(v.integer("q4", "Quantity", "2.5", 0..=999), None);
    }

    #[test]
    fn test_optional_float_bounds() {
        let mut v = Validator::new();
        assert_eq!(v.optional_float("lat", "Latitude", "-6.2", -90.0..=90.0), Some(Some(-6.2)));
        assert_eq!(v.optional_float("lat2", "Latitude", "91", -90.0..=90.0), None);
        assert_eq!(v.optional_float("lat3", "Latitude", "", -90.0..=90.0), Some(None));
    }

    #[test]
    fn test_resource_ids() {
        assert!(is_resource_id("ord_2024-0017"));
        assert!(!is_resource_id(""));
        assert!(!is_resource_id(".."));
        assert!(!is_resource_id("7/../admin"));
        assert!(!is_resource_id(&"a".repeat(MAX_RESOURCE_ID_LEN + 1)));

        let mut v = Validator::new();
        assert_eq!(v.optional_id("id", "Address", "  "), Some(None));
        assert_eq!(v.id("itemId", "Cart item", " 11 ").as_deref(), Some("11"));
        assert_eq!(v.optional_id("id2", "Address", ".."), None);
        let errors = v.finish(|| Some(())).unwrap_err();
        assert_eq!(errors.message("id2"), "Choose a valid address");
    }

    #[test]
    fn test_checkbox() {
        assert!(checkbox("on"));
        assert!(!checkbox(""));
    }

    #[test]
    fn test_local_redirect_target() {
        assert_eq!(local_redirect_target("/cart"), Some("/cart"));
        assert_eq!(local_redirect_target("//evil.example"), None);
        assert_eq!(local_redirect_target("https://evil.example"), None);
        assert_eq!(local_redirect_target("/\\evil.example"), None);
    }
}
