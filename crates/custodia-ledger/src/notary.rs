use thiserror::Error;
use tracing::info;

use custodia_types::{CaseId, LinkHash};

/// Failure reported by an external notarization sink.
#[derive(Debug, Error)]
#[error("notarization sink failure: {0}")]
pub struct NotaryError(pub String);

/// One-way, best-effort external notarization.
///
/// After `seal`, the core hands a sink exactly two values: the case
/// identifier and the terminal link hash. The core never blocks on,
/// retries, or depends on the sink's success — notarization is advisory
/// corroboration (an external timestamping or anchoring service), not a
/// correctness dependency.
pub trait NotarySink: Send + Sync {
    fn submit(&self, case_id: &CaseId, terminal_link: &LinkHash) -> Result<(), NotaryError>;
}

/// Notary that records submissions in the log and nothing else. Useful as
/// a default sink and in environments without an anchoring service.
pub struct TracingNotary;

impl NotarySink for TracingNotary {
    fn submit(&self, case_id: &CaseId, terminal_link: &LinkHash) -> Result<(), NotaryError> {
        info!(case_id = %case_id, terminal_link = %terminal_link, "terminal link submitted for notarization");
        Ok(())
    }
}
