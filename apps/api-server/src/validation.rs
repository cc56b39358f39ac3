//! Request payload validation.
//!
//! The rules are declared on `PostDto` with `validator` derives; this module
//! turns the crate's error map into the ordered `ValidationResult` the
//! handlers report.

use tt_core::validation::{ValidationResult, Validator};
use tt_shared::PostDto;
use validator::{Validate, ValidationError};

pub use tt_shared::MAX_TITLE_CHARS;

/// Order in which failing fields are listed; unknown fields sort last.
const FIELD_ORDER: [&str; 3] = ["title", "body", "id"];

fn rank(field: &str) -> usize {
    FIELD_ORDER
        .iter()
        .position(|f| *f == field)
        .unwrap_or(FIELD_ORDER.len())
}

fn reason(error: &ValidationError) -> String {
    error
        .message
        .as_ref()
        .map(|m| m.to_string())
        .unwrap_or_else(|| error.code.to_string())
}

/// Rules for a submitted post.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostValidator;

impl Validator<PostDto> for PostValidator {
    fn validate(&self, dto: &PostDto) -> ValidationResult {
        let mut result = ValidationResult::new();
        let Err(errors) = dto.validate() else {
            return result;
        };

        let mut failures: Vec<(String, &Vec<ValidationError>)> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| (field.to_string(), errs))
            .collect();
        failures.sort_by(|(a, _), (b, _)| rank(a).cmp(&rank(b)).then_with(|| a.cmp(b)));

        for (field, errs) in failures {
            for error in errs {
                result.add(field.as_str(), reason(error));
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn fields(result: &ValidationResult) -> Vec<&str> {
        result.errors().iter().map(|e| e.field.as_str()).collect()
    }

    #[test]
    fn test_title_and_body_pass() {
        let result = PostValidator.validate(&PostDto::new("Hello", "World"));
        assert!(result.is_valid());
    }

    #[test]
    fn test_empty_body_is_allowed() {
        let result = PostValidator.validate(&PostDto::new("Hello", ""));
        assert!(result.is_valid());
    }

    #[test]
    fn test_empty_title_is_rejected() {
        let result = PostValidator.validate(&PostDto::new("", "x"));
        assert_eq!(fields(&result), vec!["title"]);
    }

    #[test]
    fn test_blank_title_is_rejected() {
        let result = PostValidator.validate(&PostDto::new("   ", "x"));
        assert!(result.has_field("title"));
    }

    #[test]
    fn test_overlong_title_is_rejected() {
        let title = "a".repeat(MAX_TITLE_CHARS + 1);
        let result = PostValidator.validate(&PostDto::new(title, "x"));
        assert!(result.has_field("title"));
    }

    #[test]
    fn test_missing_fields_each_reported() {
        let result = PostValidator.validate(&PostDto::default());
        assert_eq!(fields(&result), vec!["title", "body"]);
    }

    #[test]
    fn test_malformed_id_is_rejected() {
        let dto = PostDto {
            id: Some("not-a-uuid".to_string()),
            ..PostDto::new("Hello", "World")
        };
        let result = PostValidator.validate(&dto);
        assert_eq!(fields(&result), vec!["id"]);
    }

    #[test]
    fn test_well_formed_id_passes() {
        let dto = PostDto {
            id: Some(Uuid::new_v4().to_string()),
            ..PostDto::new("Hello", "World")
        };
        assert!(PostValidator.validate(&dto).is_valid());
    }

    #[test]
    fn test_reasons_are_readable() {
        let result = PostValidator.validate(&PostDto::new("", "x"));
        assert_eq!(result.errors()[0].reason, "must not be empty");

        let result = PostValidator.validate(&PostDto::default());
        assert_eq!(result.errors()[1].reason, "is required");
    }

    #[test]
    fn test_every_failing_field_in_stable_order() {
        let dto = PostDto {
            id: Some("nope".to_string()),
            ..PostDto::default()
        };
        for _ in 0..5 {
            let result = PostValidator.validate(&dto);
            assert_eq!(fields(&result), vec!["title", "body", "id"]);
        }
    }
}
