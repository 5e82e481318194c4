use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use custodia_digest::DigestSet;
use custodia_types::{
    CaseId, Digest, DigestAlgorithm, EvidenceId, EvidenceMetadata, LinkHash, SourceDescriptor,
};

use crate::error::LedgerError;

/// Domain tag prepended to every link computation. Prevents a ledger entry
/// hash from colliding with any other Custodia hash over the same bytes.
const LINK_DOMAIN: &[u8] = b"custodia-entry-v1:";

/// Canonical link payload.
///
/// The link hash is BLAKE3 over `LINK_DOMAIN` followed by the JSON encoding
/// of this struct, with fields in exactly this declaration order and
/// digests as a name-sorted map of `algorithm name → hex value`. The
/// encoding is fixed here once so that independent implementations
/// reproduce identical link hashes. Descriptive fields (source, timestamps,
/// location, attributes) are deliberately outside the payload.
#[derive(Serialize)]
struct LinkPayload {
    seq: u64,
    case_id: String,
    evidence_id: String,
    digests: BTreeMap<&'static str, String>,
    size_bytes: u64,
    prev_link: String,
}

/// Compute the link hash for one entry's chained fields.
fn compute_link(
    seq: u64,
    case_id: &CaseId,
    evidence_id: &EvidenceId,
    digests: &BTreeMap<DigestAlgorithm, Digest>,
    size_bytes: u64,
    prev_link: &LinkHash,
) -> Result<LinkHash, LedgerError> {
    let payload = LinkPayload {
        seq,
        case_id: case_id.as_str().to_string(),
        evidence_id: evidence_id.as_str().to_string(),
        digests: digests
            .iter()
            .map(|(algo, digest)| (algo.name(), digest.to_hex()))
            .collect(),
        size_bytes,
        prev_link: prev_link.to_hex(),
    };

    let encoded =
        serde_json::to_vec(&payload).map_err(|e| LedgerError::Serialization(e.to_string()))?;

    let mut hasher = blake3::Hasher::new();
    hasher.update(LINK_DOMAIN);
    hasher.update(&encoded);
    Ok(LinkHash::from_hash(*hasher.finalize().as_bytes()))
}

/// The digests and size of one fingerprinted evidence item, paired with its
/// collector-supplied metadata. This is what `CustodyLedger::append` takes;
/// sequencing and linking are the ledger's job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryInput {
    pub metadata: EvidenceMetadata,
    pub digests: BTreeMap<DigestAlgorithm, Digest>,
    pub size_bytes: u64,
}

impl EntryInput {
    /// Pair metadata with the output of a digest engine run.
    pub fn new(metadata: EvidenceMetadata, digests: DigestSet) -> Self {
        let size_bytes = digests.size_bytes();
        Self {
            metadata,
            digests: digests.into_map(),
            size_bytes,
        }
    }

    /// Build from already-separated parts.
    pub fn from_parts(
        metadata: EvidenceMetadata,
        digests: BTreeMap<DigestAlgorithm, Digest>,
        size_bytes: u64,
    ) -> Self {
        Self {
            metadata,
            digests,
            size_bytes,
        }
    }
}

/// The atomic, immutable unit of the custody chain.
///
/// `link` binds `{seq, case_id, evidence_id, digests, size_bytes,
/// prev_link}`; altering any of those fields in any entry, or reordering or
/// deleting entries, breaks every subsequent link. The remaining fields are
/// descriptive provenance, carried but not chained.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Position in the ledger, contiguous from 0.
    pub seq: u64,
    pub case_id: CaseId,
    pub evidence_id: EvidenceId,
    /// Where the evidence came from (descriptive, not chained).
    pub source: SourceDescriptor,
    /// Collector-reported acquisition time (descriptive, not chained).
    pub acquired_at: DateTime<Utc>,
    /// Stored location of the artifact, used by verification resolvers.
    pub location: String,
    /// Free-form collector attributes, carried opaquely.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Content fingerprints, at least one.
    #[serde(with = "digest_map")]
    pub digests: BTreeMap<DigestAlgorithm, Digest>,
    /// Evidence size in bytes, as consumed during digesting.
    pub size_bytes: u64,
    /// Link of the preceding entry, or the ledger genesis for entry 0.
    pub prev_link: LinkHash,
    /// This entry's own link hash.
    pub link: LinkHash,
}

impl LedgerEntry {
    /// Build a fully populated entry, computing its link.
    ///
    /// Fails with [`LedgerError::InvalidMetadata`] if the case id,
    /// evidence id, or digest set is empty. Pure computation; no side
    /// effects.
    pub fn build(
        seq: u64,
        case_id: CaseId,
        prev_link: LinkHash,
        input: EntryInput,
    ) -> Result<Self, LedgerError> {
        if case_id.as_str().is_empty() {
            return Err(LedgerError::InvalidMetadata {
                reason: "case id is empty".into(),
            });
        }
        if input.metadata.evidence_id.as_str().is_empty() {
            return Err(LedgerError::InvalidMetadata {
                reason: "evidence id is empty".into(),
            });
        }
        if input.digests.is_empty() {
            return Err(LedgerError::InvalidMetadata {
                reason: "at least one digest is required".into(),
            });
        }

        let link = compute_link(
            seq,
            &case_id,
            &input.metadata.evidence_id,
            &input.digests,
            input.size_bytes,
            &prev_link,
        )?;

        Ok(Self {
            seq,
            case_id,
            evidence_id: input.metadata.evidence_id,
            source: input.metadata.source,
            acquired_at: input.metadata.acquired_at,
            location: input.metadata.location,
            attributes: input.metadata.attributes,
            digests: input.digests,
            size_bytes: input.size_bytes,
            prev_link,
            link,
        })
    }

    /// Recompute this entry's link from its stored fields.
    ///
    /// Used by verification: the stored `link` is never trusted, only
    /// compared against this recomputation.
    pub fn recompute_link(&self) -> Result<LinkHash, LedgerError> {
        if self.digests.is_empty() {
            return Err(LedgerError::InvalidMetadata {
                reason: "at least one digest is required".into(),
            });
        }
        compute_link(
            self.seq,
            &self.case_id,
            &self.evidence_id,
            &self.digests,
            self.size_bytes,
            &self.prev_link,
        )
    }

    /// The algorithms recorded for this entry, in canonical order.
    pub fn algorithms(&self) -> Vec<DigestAlgorithm> {
        self.digests.keys().copied().collect()
    }
}

/// Serde adapter storing the digest map as `algorithm name → hex value`.
mod digest_map {
    use std::collections::BTreeMap;
    use std::str::FromStr;

    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    use custodia_types::{Digest, DigestAlgorithm};

    pub fn serialize<S: Serializer>(
        digests: &BTreeMap<DigestAlgorithm, Digest>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_map(digests.iter().map(|(algo, d)| (algo.name(), d.to_hex())))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<DigestAlgorithm, Digest>, D::Error> {
        let raw = BTreeMap::<String, String>::deserialize(deserializer)?;
        raw.into_iter()
            .map(|(name, hex)| {
                let algo = DigestAlgorithm::from_str(&name).map_err(D::Error::custom)?;
                let digest = Digest::from_hex(algo, &hex).map_err(D::Error::custom)?;
                Ok((algo, digest))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use custodia_digest::DigestEngine;
    use custodia_types::SourceDescriptor;

    use super::*;

    fn input(evidence_id: &str, bytes: &[u8]) -> EntryInput {
        let metadata = EvidenceMetadata::new(
            EvidenceId::new(evidence_id).unwrap(),
            SourceDescriptor::new("aws", "cloudtrail"),
            format!("/evidence/{evidence_id}"),
        );
        let digests = DigestEngine::new()
            .digest_bytes(bytes, &[DigestAlgorithm::Sha256, DigestAlgorithm::Sha512])
            .unwrap();
        EntryInput::new(metadata, digests)
    }

    fn case() -> CaseId {
        CaseId::new("CASE-1").unwrap()
    }

    #[test]
    fn build_computes_recomputable_link() {
        let entry =
            LedgerEntry::build(0, case(), LinkHash::GENESIS, input("e1", b"bytes")).unwrap();
        assert_eq!(entry.seq, 0);
        assert_eq!(entry.prev_link, LinkHash::GENESIS);
        assert_eq!(entry.recompute_link().unwrap(), entry.link);
    }

    #[test]
    fn link_is_deterministic() {
        let a = LedgerEntry::build(3, case(), LinkHash::from_hash([7; 32]), input("e1", b"x"))
            .unwrap();
        let b = LedgerEntry::build(3, case(), LinkHash::from_hash([7; 32]), input("e1", b"x"))
            .unwrap();
        assert_eq!(a.link, b.link);
    }

    #[test]
    fn link_depends_on_every_chained_field() {
        let base = LedgerEntry::build(0, case(), LinkHash::GENESIS, input("e1", b"x")).unwrap();

        let other_seq =
            LedgerEntry::build(1, case(), LinkHash::GENESIS, input("e1", b"x")).unwrap();
        assert_ne!(base.link, other_seq.link);

        let other_evidence =
            LedgerEntry::build(0, case(), LinkHash::GENESIS, input("e2", b"x")).unwrap();
        assert_ne!(base.link, other_evidence.link);

        let other_bytes =
            LedgerEntry::build(0, case(), LinkHash::GENESIS, input("e1", b"y")).unwrap();
        assert_ne!(base.link, other_bytes.link);

        let other_prev =
            LedgerEntry::build(0, case(), LinkHash::from_hash([1; 32]), input("e1", b"x"))
                .unwrap();
        assert_ne!(base.link, other_prev.link);
    }

    #[test]
    fn descriptive_fields_do_not_affect_link() {
        let mut a = input("e1", b"x");
        let mut b = input("e1", b"x");
        a.metadata.attributes.insert("region".into(), "us-east-1".into());
        b.metadata.location = "/somewhere/else".into();

        let ea = LedgerEntry::build(0, case(), LinkHash::GENESIS, a).unwrap();
        let eb = LedgerEntry::build(0, case(), LinkHash::GENESIS, b).unwrap();
        assert_eq!(ea.link, eb.link);
    }

    #[test]
    fn empty_digest_set_is_rejected() {
        let mut i = input("e1", b"x");
        i.digests.clear();
        let err = LedgerEntry::build(0, case(), LinkHash::GENESIS, i).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidMetadata { .. }));
    }

    #[test]
    fn serde_roundtrip_preserves_link() {
        let entry =
            LedgerEntry::build(0, case(), LinkHash::GENESIS, input("e1", b"bytes")).unwrap();
        let json = serde_json::to_string(&entry).unwrap();
        let parsed: LedgerEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, entry);
        assert_eq!(parsed.recompute_link().unwrap(), entry.link);
    }

    #[test]
    fn digest_map_serializes_by_name() {
        let entry =
            LedgerEntry::build(0, case(), LinkHash::GENESIS, input("e1", b"bytes")).unwrap();
        let value: serde_json::Value = serde_json::to_value(&entry).unwrap();
        assert!(value["digests"]["sha256"].is_string());
        assert!(value["digests"]["sha512"].is_string());
    }

    #[test]
    fn unknown_algorithm_in_stored_entry_fails_parse() {
        let entry =
            LedgerEntry::build(0, case(), LinkHash::GENESIS, input("e1", b"bytes")).unwrap();
        let mut value: serde_json::Value = serde_json::to_value(&entry).unwrap();
        value["digests"]["md5"] = serde_json::Value::String("00".repeat(16));
        assert!(serde_json::from_value::<LedgerEntry>(value).is_err());
    }
}
