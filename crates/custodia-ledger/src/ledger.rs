use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use custodia_types::{CaseId, LinkHash};

use crate::entry::{EntryInput, LedgerEntry};
use crate::error::LedgerError;
use crate::manifest::{Manifest, MANIFEST_SCHEMA_VERSION};
use crate::notary::NotarySink;

/// Mutable ledger state. The entry list and the sealed flag (and through
/// the entries, the sequence counter and terminal link) are one unit:
/// they are only ever read or advanced under the same lock.
struct LedgerState {
    entries: Vec<LedgerEntry>,
    sealed_at: Option<DateTime<Utc>>,
}

impl LedgerState {
    fn terminal_link(&self, genesis: LinkHash) -> LinkHash {
        self.entries.last().map(|e| e.link).unwrap_or(genesis)
    }
}

/// The ordered, append-only custody ledger for exactly one case.
///
/// Created empty when a collection run begins; one entry is appended per
/// successfully fingerprinted evidence item; sealed when collection ends,
/// at which point the terminal link becomes the case's integrity anchor.
/// A sealed ledger never reopens for appending; start a
/// [continuation](CustodyLedger::continuation) ledger for further
/// collection.
///
/// `append` is safe to call from many collection threads at once: the
/// ledger serializes appends through one internal exclusive lock, and
/// entry order is the order appends are admitted through that lock.
/// Digesting is expected to happen before `append`, so slow artifact I/O
/// never serializes unrelated collectors.
pub struct CustodyLedger {
    case_id: CaseId,
    ledger_id: Uuid,
    created_at: DateTime<Utc>,
    genesis: LinkHash,
    inner: Mutex<LedgerState>,
}

impl CustodyLedger {
    /// Open a new, empty ledger for a case.
    pub fn new(case_id: CaseId) -> Self {
        let ledger = Self {
            case_id,
            ledger_id: Uuid::new_v4(),
            created_at: Utc::now(),
            genesis: LinkHash::GENESIS,
            inner: Mutex::new(LedgerState {
                entries: Vec::new(),
                sealed_at: None,
            }),
        };
        info!(
            case_id = %ledger.case_id,
            ledger_id = %ledger.ledger_id,
            "custody ledger opened"
        );
        ledger
    }

    /// Open a new ledger chained to a prior session: its genesis is the
    /// prior ledger's terminal link, preserving custody continuity across
    /// collection runs.
    pub fn continuation(case_id: CaseId, prior_terminal: LinkHash) -> Self {
        let mut ledger = Self::new(case_id);
        ledger.genesis = prior_terminal;
        ledger
    }

    /// Append one fingerprinted evidence item.
    ///
    /// Assigns the next sequence number and the current terminal link,
    /// builds the entry, and stores it — all under the ledger's exclusive
    /// lock. A failed build leaves the ledger untouched; no partial entry
    /// is ever visible. Fails with [`LedgerError::Sealed`] after `seal`.
    pub fn append(&self, input: EntryInput) -> Result<LedgerEntry, LedgerError> {
        let mut state = self.lock()?;
        if state.sealed_at.is_some() {
            return Err(LedgerError::Sealed);
        }

        let seq = state.entries.len() as u64;
        let prev_link = state.terminal_link(self.genesis);
        let entry = LedgerEntry::build(seq, self.case_id.clone(), prev_link, input)?;

        debug!(
            case_id = %self.case_id,
            seq,
            evidence_id = %entry.evidence_id,
            link = %entry.link.short_hex(),
            "entry appended"
        );
        state.entries.push(entry.clone());
        Ok(entry)
    }

    /// Seal the ledger, making it immutable to further appends.
    ///
    /// Returns the terminal link — the genesis constant if no entries were
    /// appended. Idempotent: sealing twice returns the same terminal link
    /// and keeps the first seal timestamp.
    pub fn seal(&self) -> Result<LinkHash, LedgerError> {
        let mut state = self.lock()?;
        if state.sealed_at.is_none() {
            state.sealed_at = Some(Utc::now());
            info!(
                case_id = %self.case_id,
                entries = state.entries.len(),
                terminal = %state.terminal_link(self.genesis).short_hex(),
                "custody ledger sealed"
            );
        }
        Ok(state.terminal_link(self.genesis))
    }

    /// Submit the sealed ledger's terminal link to an external notary.
    ///
    /// Best-effort, one-way: a sink failure is logged and reported as
    /// `Ok(false)` but never affects ledger validity. Fails with
    /// [`LedgerError::NotSealed`] if the ledger is still open.
    pub fn notarize(&self, sink: &dyn NotarySink) -> Result<bool, LedgerError> {
        let terminal = {
            let state = self.lock()?;
            if state.sealed_at.is_none() {
                return Err(LedgerError::NotSealed);
            }
            state.terminal_link(self.genesis)
        };

        match sink.submit(&self.case_id, &terminal) {
            Ok(()) => Ok(true),
            Err(e) => {
                warn!(case_id = %self.case_id, error = %e, "notarization failed; ledger validity unaffected");
                Ok(false)
            }
        }
    }

    /// Snapshot of all entries, in sequence order.
    pub fn entries(&self) -> Result<Vec<LedgerEntry>, LedgerError> {
        Ok(self.lock()?.entries.clone())
    }

    /// The current terminal link: the last entry's link, or the genesis
    /// constant while the ledger is empty.
    pub fn terminal_link(&self) -> Result<LinkHash, LedgerError> {
        let state = self.lock()?;
        Ok(state.terminal_link(self.genesis))
    }

    pub fn len(&self) -> Result<u64, LedgerError> {
        Ok(self.lock()?.entries.len() as u64)
    }

    pub fn is_empty(&self) -> Result<bool, LedgerError> {
        Ok(self.lock()?.entries.is_empty())
    }

    pub fn is_sealed(&self) -> Result<bool, LedgerError> {
        Ok(self.lock()?.sealed_at.is_some())
    }

    pub fn case_id(&self) -> &CaseId {
        &self.case_id
    }

    pub fn ledger_id(&self) -> Uuid {
        self.ledger_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The genesis constant this ledger chains from. All zeros for a fresh
    /// ledger; a prior terminal link for a continuation ledger.
    pub fn genesis(&self) -> LinkHash {
        self.genesis
    }

    /// Export the sealed ledger as a manifest.
    ///
    /// Fails with [`LedgerError::NotSealed`] while the ledger is open: a
    /// manifest is the durable form of a finished collection run, not a
    /// progress snapshot.
    pub fn to_manifest(&self) -> Result<Manifest, LedgerError> {
        let state = self.lock()?;
        let sealed_at = state.sealed_at.ok_or(LedgerError::NotSealed)?;
        Ok(Manifest {
            schema_version: MANIFEST_SCHEMA_VERSION.to_string(),
            case_id: self.case_id.clone(),
            ledger_id: self.ledger_id,
            created_at: self.created_at,
            sealed_at,
            genesis: self.genesis,
            terminal_link: state.terminal_link(self.genesis),
            entries: state.entries.clone(),
        })
    }

    /// Rehydrate a sealed ledger from a loaded manifest. Used for
    /// inspection and for chaining continuation ledgers; the chain itself
    /// is validated by the verifier, not here.
    pub(crate) fn from_manifest(manifest: Manifest) -> Self {
        Self {
            case_id: manifest.case_id,
            ledger_id: manifest.ledger_id,
            created_at: manifest.created_at,
            genesis: manifest.genesis,
            inner: Mutex::new(LedgerState {
                entries: manifest.entries,
                sealed_at: Some(manifest.sealed_at),
            }),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, LedgerState>, LedgerError> {
        self.inner.lock().map_err(|_| LedgerError::LockPoisoned)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::thread;

    use custodia_digest::DigestEngine;
    use custodia_types::{DigestAlgorithm, EvidenceId, EvidenceMetadata, SourceDescriptor};

    use super::*;

    fn input(evidence_id: &str, bytes: &[u8]) -> EntryInput {
        let metadata = EvidenceMetadata::new(
            EvidenceId::new(evidence_id).unwrap(),
            SourceDescriptor::new("gcp", "audit-logs"),
            format!("/evidence/{evidence_id}"),
        );
        let digests = DigestEngine::new()
            .digest_bytes(bytes, &[DigestAlgorithm::Sha256])
            .unwrap();
        EntryInput::new(metadata, digests)
    }

    fn ledger() -> CustodyLedger {
        CustodyLedger::new(CaseId::new("CASE-7").unwrap())
    }

    #[test]
    fn sequential_appends_form_a_chain() {
        let ledger = ledger();
        for i in 0..5 {
            ledger
                .append(input(&format!("e{i}"), format!("bytes-{i}").as_bytes()))
                .unwrap();
        }

        let entries = ledger.entries().unwrap();
        assert_eq!(entries.len(), 5);
        assert_eq!(entries[0].prev_link, LinkHash::GENESIS);
        for i in 1..entries.len() {
            assert_eq!(entries[i].seq, i as u64);
            assert_eq!(entries[i].prev_link, entries[i - 1].link);
        }
        assert_eq!(
            ledger.terminal_link().unwrap(),
            entries.last().unwrap().link
        );
    }

    #[test]
    fn append_after_seal_fails() {
        let ledger = ledger();
        ledger.append(input("e0", b"x")).unwrap();
        ledger.seal().unwrap();

        let err = ledger.append(input("e1", b"y")).unwrap_err();
        assert_eq!(err, LedgerError::Sealed);
        assert_eq!(ledger.len().unwrap(), 1);
    }

    #[test]
    fn empty_ledger_seals_to_genesis() {
        let ledger = ledger();
        let terminal = ledger.seal().unwrap();
        assert_eq!(terminal, LinkHash::GENESIS);
        assert!(ledger.is_sealed().unwrap());
    }

    #[test]
    fn seal_is_idempotent() {
        let ledger = ledger();
        ledger.append(input("e0", b"x")).unwrap();
        let first = ledger.seal().unwrap();
        let second = ledger.seal().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn failed_append_leaves_ledger_untouched() {
        let ledger = ledger();
        ledger.append(input("e0", b"x")).unwrap();
        let before = ledger.terminal_link().unwrap();

        let mut bad = input("e1", b"y");
        bad.digests = BTreeMap::new();
        let err = ledger.append(bad).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidMetadata { .. }));

        assert_eq!(ledger.len().unwrap(), 1);
        assert_eq!(ledger.terminal_link().unwrap(), before);

        // The sequence is still contiguous for the next good append.
        let next = ledger.append(input("e2", b"z")).unwrap();
        assert_eq!(next.seq, 1);
    }

    #[test]
    fn manifest_requires_seal() {
        let ledger = ledger();
        ledger.append(input("e0", b"x")).unwrap();
        assert_eq!(ledger.to_manifest().unwrap_err(), LedgerError::NotSealed);

        ledger.seal().unwrap();
        let manifest = ledger.to_manifest().unwrap();
        assert_eq!(manifest.entries.len(), 1);
        assert_eq!(manifest.terminal_link, ledger.terminal_link().unwrap());
    }

    #[test]
    fn continuation_chains_from_prior_terminal() {
        let first = ledger();
        first.append(input("e0", b"x")).unwrap();
        let terminal = first.seal().unwrap();

        let second = CustodyLedger::continuation(CaseId::new("CASE-7").unwrap(), terminal);
        assert_eq!(second.genesis(), terminal);
        assert_eq!(second.terminal_link().unwrap(), terminal);

        let entry = second.append(input("e1", b"y")).unwrap();
        assert_eq!(entry.seq, 0);
        assert_eq!(entry.prev_link, terminal);
    }

    #[test]
    fn concurrent_appends_preserve_invariants() {
        let ledger = Arc::new(ledger());
        let threads = 8;
        let per_thread = 25;

        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || {
                    for i in 0..per_thread {
                        let id = format!("t{t}-e{i}");
                        ledger.append(input(&id, id.as_bytes())).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let entries = ledger.entries().unwrap();
        assert_eq!(entries.len(), threads * per_thread);

        // Contiguous sequence numbers, no loss or duplication.
        for (i, entry) in entries.iter().enumerate() {
            assert_eq!(entry.seq, i as u64);
        }
        // Intact link chain.
        assert_eq!(entries[0].prev_link, LinkHash::GENESIS);
        for i in 1..entries.len() {
            assert_eq!(entries[i].prev_link, entries[i - 1].link);
            assert_eq!(entries[i].recompute_link().unwrap(), entries[i].link);
        }
    }
}
