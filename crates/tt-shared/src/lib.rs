//! # TT Shared
//!
//! Wire types exchanged with API clients.
//! This crate has no knowledge of the domain layer so clients can depend on it alone.

pub mod dto;
pub mod response;

pub use dto::{MAX_TITLE_CHARS, PostDto};
pub use response::{ErrorResponse, FieldViolation};
