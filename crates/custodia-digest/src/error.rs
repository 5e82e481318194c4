use thiserror::Error;

/// Errors produced by the digest engine.
#[derive(Debug, Error)]
pub enum DigestError {
    /// The stream errored mid-read. Retryable by the caller on the same
    /// artifact; any partial digest state has been discarded.
    #[error("read failure while digesting: {0}")]
    ReadFailure(#[from] std::io::Error),

    /// The caller requested an empty algorithm set. Raised before any
    /// bytes are consumed.
    #[error("no digest algorithms requested")]
    NoAlgorithms,
}
