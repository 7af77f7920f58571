// Note request payloads, list filters and path ids

use crate::domain::validation::{trimmed, Validator};
use crate::errors::{AppError, FieldError, Result};
use serde::Deserialize;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Body of both create and update; updates replace every field
#[derive(Debug, Default, Deserialize)]
pub struct NoteRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NoteInput {
    pub title: String,
    pub content: String,
    pub category: String,
}

impl NoteRequest {
    pub fn validate(self) -> Result<NoteInput> {
        let mut v = Validator::new();
        let input = NoteInput {
            title: v.required("title", self.title, 1..=255),
            content: v.required("content", self.content, 1..=usize::MAX),
            category: v.optional("category", trimmed(self.category), 100),
        };
        v.finish(input)
    }
}

/// Raw `?category&page&limit` query; numbers are parsed by hand so a bad
/// value is reported as a field error instead of a rejection
#[derive(Debug, Default, Deserialize)]
pub struct NotesQuery {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub limit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesFilter {
    pub category: Option<String>,
    pub page: i64,
    pub limit: i64,
}

impl NotesFilter {
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for NotesFilter {
    fn default() -> Self {
        Self {
            category: None,
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl NotesQuery {
    /// Non-positive page or limit fall back to the defaults
    pub fn validate(self) -> Result<NotesFilter> {
        let mut v = Validator::new();
        let page = parse_number(&mut v, "page", self.page);
        let limit = parse_number(&mut v, "limit", self.limit);

        let page = page.filter(|p| *p > 0).unwrap_or(1);
        let limit = limit.filter(|l| *l > 0).unwrap_or(DEFAULT_PAGE_SIZE);
        if limit > MAX_PAGE_SIZE {
            v.push(
                FieldError::new("limit", "Limit cannot exceed 100 items per page")
                    .with_value(limit.to_string()),
            );
        } else if (page - 1).checked_mul(limit).is_none() {
            v.push(FieldError::new("page", "Page is out of range").with_value(page.to_string()));
        }

        let category = trimmed(self.category).filter(|c| !c.is_empty());
        v.finish(NotesFilter {
            category,
            page,
            limit,
        })
    }
}

fn parse_number(v: &mut Validator, field: &str, raw: Option<String>) -> Option<i64> {
    let raw = raw?;
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<i64>() {
        Ok(n) => Some(n),
        Err(_) => {
            v.push(FieldError::new(field, "This field must be a number").with_value(raw));
            None
        }
    }
}

/// Parse the `{id}` path segment of a note route
pub fn parse_note_id(raw: &str) -> Result<i64> {
    raw.parse::<i64>().map_err(|_| {
        AppError::Validation(vec![
            FieldError::new("id", "Note ID must be a valid number").with_value(raw)
        ])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>, limit: Option<&str>) -> NotesQuery {
        NotesQuery {
            category: None,
            page: page.map(str::to_string),
            limit: limit.map(str::to_string),
        }
    }

    #[test]
    fn test_note_request_validation() {
        let input = NoteRequest {
            title: Some("Groceries".to_string()),
            content: Some("Milk, eggs".to_string()),
            category: Some(" personal ".to_string()),
        }
        .validate()
        .unwrap();
        assert_eq!(input.category, "personal");

        let missing = NoteRequest {
            title: Some("x".repeat(256)),
            ..Default::default()
        }
        .validate();
        match missing {
            Err(AppError::Validation(errors)) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["title", "content"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_category_is_optional() {
        let input = NoteRequest {
            title: Some("t".to_string()),
            content: Some("c".to_string()),
            category: None,
        }
        .validate()
        .unwrap();
        assert_eq!(input.category, "");
    }

    #[test]
    fn test_filter_defaults() {
        assert_eq!(query(None, None).validate().unwrap(), NotesFilter::default());
        assert_eq!(query(Some("0"), Some("-5")).validate().unwrap(), NotesFilter::default());
    }

    #[test]
    fn test_filter_offset() {
        let filter = query(Some("3"), Some("20")).validate().unwrap();
        assert_eq!(filter.offset(), 40);
    }

    #[test]
    fn test_limit_over_maximum_is_rejected() {
        assert!(query(None, Some("100")).validate().is_ok());
        match query(None, Some("101")).validate() {
            Err(AppError::Validation(errors)) => {
                assert_eq!(errors[0].field, "limit");
                assert_eq!(errors[0].message, "Limit cannot exceed 100 items per page");
                assert_eq!(errors[0].value.as_deref(), Some("101"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_page_past_addressable_offset_is_rejected() {
        match query(Some("9223372036854775807"), Some("10")).validate() {
            Err(AppError::Validation(errors)) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "page");
                assert_eq!(errors[0].message, "Page is out of range");
            }
            other => panic!("unexpected {:?}", other),
        }

        // A single-item page still has a representable offset
        let filter = query(Some("9223372036854775807"), Some("1")).validate().unwrap();
        assert_eq!(filter.offset(), i64::MAX - 1);
    }

    #[test]
    fn test_offset_saturates() {
        let filter = NotesFilter {
            category: None,
            page: i64::MAX,
            limit: MAX_PAGE_SIZE,
        };
        assert_eq!(filter.offset(), i64::MAX);
    }

    #[test]
    fn test_non_numeric_page_is_rejected() {
        assert!(query(Some("two"), None).validate().is_err());
    }

    #[test]
    fn test_parse_note_id() {
        assert_eq!(parse_note_id("42").unwrap(), 42);
        assert!(matches!(parse_note_id("abc"), Err(AppError::Validation(_))));
    }
}
