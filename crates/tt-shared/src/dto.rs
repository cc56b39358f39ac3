//! Data Transfer Objects - request/response types for the API.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Longest accepted post title, in characters.
pub const MAX_TITLE_CHARS: usize = 200;

/// Wire representation of a post.
///
/// Every field is optional on input so the server can report precisely
/// which ones are missing. `id` is absent on create; the timestamps are
/// assigned by the server and ignored when sent by clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PostDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "uuid_shaped"))]
    pub id: Option<String>,
    #[serde(default)]
    #[validate(
        required(message = "is required"),
        length(max = 200, message = "must be at most 200 characters"),
        custom(function = "not_blank")
    )]
    pub title: Option<String>,
    #[serde(default)]
    #[validate(required(message = "is required"))]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl PostDto {
    /// Convenience constructor for a create payload.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            body: Some(body.into()),
            ..Default::default()
        }
    }
}

fn rule(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(rule("blank", "must not be empty"));
    }
    Ok(())
}

fn uuid_shaped(value: &str) -> Result<(), ValidationError> {
    Uuid::parse_str(value)
        .map(|_| ())
        .map_err(|_| rule("uuid", "must be a valid UUID"))
}
