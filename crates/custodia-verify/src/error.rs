use thiserror::Error;

/// Structural errors during verification.
///
/// Tampering, missing artifacts, and chain breaks are *verdicts* in the
/// report, never errors; only an unreadable manifest stops verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("malformed manifest: {reason}")]
    MalformedManifest { reason: String },
}

impl From<custodia_ledger::LedgerError> for VerifyError {
    fn from(err: custodia_ledger::LedgerError) -> Self {
        Self::MalformedManifest {
            reason: err.to_string(),
        }
    }
}
