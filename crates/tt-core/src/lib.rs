//! # TT Core
//!
//! The domain layer of the post API.
//! This crate contains the post model, the ports infrastructure implements,
//! and the default post service. It has zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;
pub mod validation;

pub use error::{DomainError, RepoError};
