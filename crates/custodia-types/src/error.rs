use thiserror::Error;

/// Errors produced by type construction and parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("identifier field '{field}' must not be empty")]
    EmptyIdentifier { field: &'static str },

    #[error("unsupported digest algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}
