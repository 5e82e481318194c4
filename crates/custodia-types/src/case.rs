use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Opaque case identifier.
///
/// Constant across every entry of one ledger. The core never interprets it;
/// it is whatever the investigating organisation uses to name a case
/// (e.g. `"CASE-2025-0042"`).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseId(String);

impl CaseId {
    /// Create a case identifier. Must be non-empty.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        if id.is_empty() {
            return Err(TypeError::EmptyIdentifier { field: "case_id" });
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CaseId({})", self.0)
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of one piece of evidence, unique within its case.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvidenceId(String);

impl EvidenceId {
    /// Create an evidence identifier. Must be non-empty.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        if id.is_empty() {
            return Err(TypeError::EmptyIdentifier {
                field: "evidence_id",
            });
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for EvidenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EvidenceId({})", self.0)
    }
}

impl fmt::Display for EvidenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
