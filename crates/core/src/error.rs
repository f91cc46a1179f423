//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid {field}: {value:?} is not an integer")]
    InvalidInteger { field: &'static str, value: String },

    #[error("invalid list selector: {0:?}")]
    InvalidListSelector(String),

    #[error("invalid song payload: {0}")]
    InvalidPayload(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
