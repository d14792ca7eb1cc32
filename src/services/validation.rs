//! Form validation
//!
//! Validators are plain functions returning `Option<FieldError>`; a form runs
//! a list of them through [`validate`] and gets back every failure keyed by
//! field name.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex is valid")
});

/// A single failed rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Every failed rule of a form, grouped by field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Errors holding a single message
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn push(&mut self, error: FieldError) {
        self.add(error.field, error.message);
    }

    pub fn push_opt(&mut self, error: Option<FieldError>) {
        if let Some(error) = error {
            self.push(error);
        }
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    pub fn has_any(&self) -> bool {
        !self.0.is_empty()
    }

    /// Messages recorded for `field`
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `Err(self)` when anything failed
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.has_any() {
            Err(self)
        } else {
            Ok(())
        }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages: Vec<&str> = self
            .0
            .values()
            .flat_map(|m| m.iter().map(String::as_str))
            .collect();
        write!(f, "{}", messages.join(" "))
    }
}

/// Run validators and collect their failures
pub fn validate<I>(checks: I) -> FieldErrors
where
    I: IntoIterator<Item = Option<FieldError>>,
{
    let mut errors = FieldErrors::new();
    for error in checks.into_iter().flatten() {
        errors.push(error);
    }
    errors
}

/// `"Title can not be blank."` style check on the trimmed value
pub fn string_is_present(field: &str, label: &str, value: &str) -> Option<FieldError> {
    if value.trim().is_empty() {
        Some(FieldError::new(field, format!("{} can not be blank.", label)))
    } else {
        None
    }
}

pub fn email_like(field: &str, value: &str) -> Option<FieldError> {
    if EMAIL_RE.is_match(value.trim()) {
        None
    } else {
        Some(FieldError::new(field, "Email does not match the email format."))
    }
}

/// Character count within `min..=max`
pub fn length_in_range(
    field: &str,
    value: &str,
    min: usize,
    max: usize,
    message: &str,
) -> Option<FieldError> {
    let len = value.chars().count();
    if len < min || len > max {
        Some(FieldError::new(field, message))
    } else {
        None
    }
}

pub fn strings_match(field: &str, value: &str, other: &str, message: &str) -> Option<FieldError> {
    if value == other {
        None
    } else {
        Some(FieldError::new(field, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_collects_failures() {
        let errors = validate([
            string_is_present("title", "Title", "  "),
            string_is_present("content", "Content", "body"),
            length_in_range("password", "abc", 6, 20, "Password is too weak."),
        ]);

        assert!(errors.has_any());
        assert_eq!(errors.get("title"), ["Title can not be blank."]);
        assert!(errors.get("content").is_empty());
        assert_eq!(errors.get("password"), ["Password is too weak."]);
    }

    #[test]
    fn test_email_like() {
        assert!(email_like("email", "ada@example.com").is_none());
        assert!(email_like("email", "ada@example").is_some());
        assert!(email_like("email", "not an email").is_some());
    }

    #[test]
    fn test_length_counts_chars() {
        assert!(length_in_range("p", "ééééé", 5, 5, "bad").is_none());
        assert!(length_in_range("p", &"x".repeat(21), 6, 20, "bad").is_some());
    }

    #[test]
    fn test_strings_match() {
        assert!(strings_match("p", "a", "a", "mismatch").is_none());
        assert_eq!(
            strings_match("p", "a", "b", "Passwords do not match").map(|e| e.message),
            Some("Passwords do not match".to_string())
        );
    }

    #[test]
    fn test_merge_and_serialize() {
        let mut errors = FieldErrors::single("email", "Email is already being used.");
        errors.merge(FieldErrors::single("email", "Email does not match the email format."));

        assert_eq!(errors.get("email").len(), 2);
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["email"][0], "Email is already being used.");
        assert!(errors.into_result().is_err());
        assert!(FieldErrors::new().into_result().is_ok());
    }
}
