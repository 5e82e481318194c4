use chrono::Utc;
use tracing::{debug, info};

use custodia_digest::{DigestEngine, DigestError};
use custodia_ledger::{LedgerEntry, Manifest};

use crate::error::VerifyError;
use crate::report::{ChainStatus, EntryReport, EntryVerdict, VerificationReport};
use crate::resolver::{ArtifactResolver, ResolveError};

/// Replays a manifest's link chain and re-fingerprints its artifacts.
pub struct Verifier {
    engine: DigestEngine,
}

impl Verifier {
    pub fn new() -> Self {
        Self {
            engine: DigestEngine::new(),
        }
    }

    /// Verifier with an explicit digest engine (e.g. a tuned chunk size).
    pub fn with_engine(engine: DigestEngine) -> Self {
        Self { engine }
    }

    /// Parse and verify a persisted manifest.
    ///
    /// Only an unreadable manifest is an error; every integrity problem in
    /// a parsed manifest is reported as a verdict.
    pub fn verify(
        &self,
        manifest_bytes: &[u8],
        resolver: &dyn ArtifactResolver,
    ) -> Result<VerificationReport, VerifyError> {
        let manifest = Manifest::from_bytes(manifest_bytes)?;
        Ok(self.verify_manifest(&manifest, resolver))
    }

    /// Verify an already-parsed manifest. Always completes.
    pub fn verify_manifest(
        &self,
        manifest: &Manifest,
        resolver: &dyn ArtifactResolver,
    ) -> VerificationReport {
        let (chain, terminal_link_matches, malformed) = self.replay_chain(manifest);

        let mut entries = Vec::with_capacity(manifest.entries.len());
        for (index, entry) in manifest.entries.iter().enumerate() {
            // Chain state never short-circuits per-entry digest checks:
            // "chain broken" and "digest mismatch" stay independently
            // observable.
            let verdict = match &malformed[index] {
                Some(reason) => EntryVerdict::EntryMalformed {
                    reason: reason.clone(),
                },
                None => self.check_artifact(entry, resolver),
            };
            debug!(seq = entry.seq, ?verdict, "entry verified");
            entries.push(EntryReport {
                seq: index as u64,
                evidence_id: entry.evidence_id.clone(),
                verdict,
            });
        }

        let report = VerificationReport {
            case_id: manifest.case_id.clone(),
            verified_at: Utc::now(),
            chain,
            terminal_link_matches,
            entries,
        };
        info!(
            case_id = %report.case_id,
            clean = report.is_clean(),
            failures = report.failures().count(),
            "verification complete"
        );
        report
    }

    /// Replay the link chain over stored fields only.
    ///
    /// Returns the chain verdict, whether the recorded terminal link
    /// matches the recomputed one, and the per-entry malformedness found
    /// while recomputing links. The chain verdict reports the lowest
    /// sequence number at which the chain first breaks; artifact bytes on
    /// disk play no part here.
    fn replay_chain(&self, manifest: &Manifest) -> (ChainStatus, bool, Vec<Option<String>>) {
        let mut first_broken: Option<u64> = None;
        let mut malformed: Vec<Option<String>> = Vec::with_capacity(manifest.entries.len());
        let mut expected_prev = manifest.genesis;

        for (index, entry) in manifest.entries.iter().enumerate() {
            let seq = index as u64;
            let mut broken_here = false;

            if entry.seq != seq {
                broken_here = true;
            }

            match entry.recompute_link() {
                Err(e) => {
                    // A malformed entry marks the chain broken from here on
                    // but does not poison the prev-link expectation for
                    // later entries; they are judged on their own fields.
                    malformed.push(Some(e.to_string()));
                    broken_here = true;
                    expected_prev = entry.link;
                }
                Ok(recomputed) => {
                    malformed.push(None);
                    if entry.prev_link != expected_prev {
                        broken_here = true;
                    }
                    if recomputed != entry.link {
                        broken_here = true;
                    }
                    expected_prev = recomputed;
                }
            }

            if broken_here && first_broken.is_none() {
                first_broken = Some(seq);
            }
        }

        let terminal_link_matches = manifest.terminal_link == expected_prev;
        let chain = match first_broken {
            None => ChainStatus::Intact,
            Some(first_broken_seq) => ChainStatus::Broken { first_broken_seq },
        };
        (chain, terminal_link_matches, malformed)
    }

    /// Re-digest one artifact and compare against the entry's stored
    /// digests, byte for byte.
    fn check_artifact(
        &self,
        entry: &LedgerEntry,
        resolver: &dyn ArtifactResolver,
    ) -> EntryVerdict {
        let reader = match resolver.open(entry) {
            Ok(reader) => reader,
            Err(ResolveError::NotFound) => return EntryVerdict::ArtifactMissing,
            Err(ResolveError::Io(reason)) => return EntryVerdict::ArtifactUnreadable { reason },
        };

        let recomputed = match self.engine.digest_stream(reader, &entry.algorithms()) {
            Ok(set) => set,
            Err(DigestError::ReadFailure(e)) => {
                return EntryVerdict::ArtifactUnreadable {
                    reason: e.to_string(),
                }
            }
            Err(DigestError::NoAlgorithms) => {
                // Unreachable for well-formed entries; malformedness is
                // caught during chain replay.
                return EntryVerdict::EntryMalformed {
                    reason: "entry records no digest algorithms".into(),
                };
            }
        };

        for (algorithm, stored) in &entry.digests {
            if recomputed.get(*algorithm) != Some(stored) {
                return EntryVerdict::DigestMismatch {
                    algorithm: *algorithm,
                };
            }
        }
        EntryVerdict::DigestMatch
    }
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new()
    }
}
