// Field validation shared by request types

use crate::errors::{AppError, FieldError, Result};
use std::ops::RangeInclusive;

/// Collects field errors so a request reports every problem at once
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    /// Required text whose length in characters must fall within `length`
    pub fn required(&mut self, field: &str, value: Option<String>, length: RangeInclusive<usize>) -> String {
        match value {
            Some(value) if !value.is_empty() => {
                self.length(field, &value, length);
                value
            }
            _ => {
                self.push(FieldError::new(field, "This field is required"));
                String::new()
            }
        }
    }

    /// Optional text; missing becomes empty
    pub fn optional(&mut self, field: &str, value: Option<String>, max: usize) -> String {
        let value = value.unwrap_or_default();
        self.length(field, &value, 0..=max);
        value
    }

    pub fn email(&mut self, field: &str, value: Option<String>) -> String {
        let value = self.required(field, value, 3..=100);
        if !value.is_empty() && !is_valid_email(&value) {
            self.push(
                FieldError::new(field, "This field must be a valid email address")
                    .with_value(value.clone()),
            );
        }
        value
    }

    fn length(&mut self, field: &str, value: &str, length: RangeInclusive<usize>) {
        let count = value.chars().count();
        if count < *length.start() {
            self.push(FieldError::new(
                field,
                format!("This field must be at least {} characters long", length.start()),
            ));
        } else if count > *length.end() {
            self.push(FieldError::new(
                field,
                format!("This field must not exceed {} characters", length.end()),
            ));
        }
    }

    /// `Ok(value)` when nothing was reported
    pub fn finish<T>(self, value: T) -> Result<T> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(AppError::Validation(self.errors))
        }
    }
}

fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    }
}

/// Trim surrounding whitespace from an optional input
pub fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn errors(result: Result<()>) -> Vec<FieldError> {
        match result {
            Err(AppError::Validation(errors)) => errors,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_email_format() {
        assert!(is_valid_email("alice@example.com"));
        assert!(!is_valid_email("alice@example"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("alice@@example.com"));
        assert!(!is_valid_email("ali ce@example.com"));
    }

    #[test]
    fn test_required_reports_missing_and_length() {
        let mut v = Validator::new();
        v.required("title", None, 1..=255);
        v.required("username", Some("ab".to_string()), 3..=50);
        v.required("full_name", Some("x".repeat(101)), 2..=100);

        let errors = errors(v.finish(()));
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0].message, "This field is required");
        assert_eq!(errors[1].message, "This field must be at least 3 characters long");
        assert_eq!(errors[2].message, "This field must not exceed 100 characters");
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let mut v = Validator::new();
        v.required("title", Some("é".repeat(255)), 1..=255);
        assert!(v.finish(()).is_ok());
    }
}
