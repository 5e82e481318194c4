use thiserror::Error;

/// Errors produced by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Append attempted after `seal`. Misuse, not retryable.
    #[error("ledger is sealed; no further entries may be appended")]
    Sealed,

    /// Export or notarization attempted before `seal`.
    #[error("ledger is not sealed; seal it before exporting or notarizing")]
    NotSealed,

    /// Required metadata missing or empty. Fails fast, before any state
    /// mutation.
    #[error("invalid evidence metadata: {reason}")]
    InvalidMetadata { reason: String },

    /// A persisted manifest did not parse or is missing required fields.
    /// Surfaced immediately, never silently repaired.
    #[error("malformed manifest: {reason}")]
    MalformedManifest { reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("manifest I/O error: {0}")]
    Io(String),

    #[error("ledger lock poisoned")]
    LockPoisoned,
}
