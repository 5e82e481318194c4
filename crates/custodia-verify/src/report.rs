use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use custodia_types::{CaseId, DigestAlgorithm, EvidenceId};

/// The verdict for one ledger entry.
///
/// Failure classes are deliberately distinct: an absent artifact is a
/// different claim than an altered one, and an unreadable artifact is a
/// different claim than either.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum EntryVerdict {
    /// Every recorded digest matched the re-read artifact bytes.
    DigestMatch,
    /// The artifact's current bytes no longer match a recorded digest.
    DigestMismatch { algorithm: DigestAlgorithm },
    /// The resolver could not locate the artifact.
    ArtifactMissing,
    /// The artifact exists but its bytes could not be read.
    ArtifactUnreadable { reason: String },
    /// The stored entry itself could not be interpreted; its link cannot
    /// even be recomputed.
    EntryMalformed { reason: String },
}

/// One entry's verdict.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryReport {
    /// Position of the entry in the manifest's entry list. Equal to the
    /// entry's stored sequence number in a well-formed manifest, but kept
    /// positional so a tampered `seq` field still yields an addressable
    /// report line.
    pub seq: u64,
    pub evidence_id: EvidenceId,
    pub verdict: EntryVerdict,
}

/// The chain-level verdict.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChainStatus {
    /// Every link recomputation matched and every `prev_link` matched its
    /// predecessor.
    Intact,
    /// The lowest sequence number at which the chain first breaks.
    Broken { first_broken_seq: u64 },
}

impl ChainStatus {
    pub fn is_intact(&self) -> bool {
        matches!(self, Self::Intact)
    }
}

/// The outcome of one verification run.
///
/// Ephemeral: produced by the verifier, not persisted as part of the
/// ledger, though callers may archive it (it serializes).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub case_id: CaseId,
    pub verified_at: DateTime<Utc>,
    pub chain: ChainStatus,
    /// Whether the manifest's recorded terminal link matches the
    /// recomputed link of the last entry (or the genesis for an empty
    /// ledger).
    pub terminal_link_matches: bool,
    pub entries: Vec<EntryReport>,
}

impl VerificationReport {
    /// Returns `true` if the chain is intact, the terminal link matches,
    /// and every entry's digests matched.
    pub fn is_clean(&self) -> bool {
        self.chain.is_intact()
            && self.terminal_link_matches
            && self
                .entries
                .iter()
                .all(|e| e.verdict == EntryVerdict::DigestMatch)
    }

    /// Entries whose verdict is anything other than a digest match.
    pub fn failures(&self) -> impl Iterator<Item = &EntryReport> {
        self.entries
            .iter()
            .filter(|e| e.verdict != EntryVerdict::DigestMatch)
    }
}
