use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use custodia_types::{CaseId, LinkHash};

use crate::entry::LedgerEntry;
use crate::error::LedgerError;
use crate::ledger::CustodyLedger;

/// Manifest schema version written by this implementation.
pub const MANIFEST_SCHEMA_VERSION: &str = "1";

/// The durable, serialized form of a sealed custody ledger.
///
/// A manifest records everything needed to re-verify the collection run
/// later: the case identifier, the genesis constant the chain started
/// from, the terminal link (the case's integrity anchor), and the full
/// ordered entry list. Loading a manifest parses structure only; chain
/// validation is the verifier's job.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub schema_version: String,
    pub case_id: CaseId,
    /// Identifier of the collection run that produced this ledger.
    pub ledger_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub sealed_at: DateTime<Utc>,
    /// The `prev_link` value of entry 0.
    pub genesis: LinkHash,
    pub terminal_link: LinkHash,
    pub entries: Vec<LedgerEntry>,
}

impl Manifest {
    /// Serialize to the on-disk JSON form.
    pub fn to_bytes(&self) -> Result<Vec<u8>, LedgerError> {
        serde_json::to_vec_pretty(self).map_err(|e| LedgerError::Serialization(e.to_string()))
    }

    /// Parse a manifest from bytes.
    ///
    /// Fails with [`LedgerError::MalformedManifest`] if the document does
    /// not parse, required fields are missing, or the schema version is
    /// unknown. Does not validate the chain.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LedgerError> {
        let manifest: Self =
            serde_json::from_slice(bytes).map_err(|e| LedgerError::MalformedManifest {
                reason: e.to_string(),
            })?;
        if manifest.schema_version != MANIFEST_SCHEMA_VERSION {
            return Err(LedgerError::MalformedManifest {
                reason: format!(
                    "unknown schema version '{}' (expected '{MANIFEST_SCHEMA_VERSION}')",
                    manifest.schema_version
                ),
            });
        }
        Ok(manifest)
    }

    /// Write the manifest to a file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), LedgerError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| LedgerError::Io(e.to_string()))?;
        }
        fs::write(path, self.to_bytes()?).map_err(|e| LedgerError::Io(e.to_string()))?;
        info!(
            case_id = %self.case_id,
            entries = self.entries.len(),
            path = %path.display(),
            "manifest saved"
        );
        Ok(())
    }

    /// Load a manifest from a file.
    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        let bytes = fs::read(path).map_err(|e| LedgerError::Io(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Rehydrate the sealed ledger this manifest was exported from.
    pub fn into_ledger(self) -> CustodyLedger {
        CustodyLedger::from_manifest(self)
    }
}

#[cfg(test)]
mod tests {
    use custodia_digest::DigestEngine;
    use custodia_types::{
        DigestAlgorithm, EvidenceId, EvidenceMetadata, SourceDescriptor,
    };

    use crate::entry::EntryInput;

    use super::*;

    fn sealed_ledger() -> CustodyLedger {
        let ledger = CustodyLedger::new(CaseId::new("CASE-9").unwrap());
        for i in 0..3 {
            let metadata = EvidenceMetadata::new(
                EvidenceId::new(format!("e{i}")).unwrap(),
                SourceDescriptor::new("azure", "activity-log"),
                format!("/evidence/e{i}"),
            );
            let digests = DigestEngine::new()
                .digest_bytes(format!("payload-{i}").as_bytes(), &[DigestAlgorithm::Sha256])
                .unwrap();
            ledger.append(EntryInput::new(metadata, digests)).unwrap();
        }
        ledger.seal().unwrap();
        ledger
    }

    #[test]
    fn roundtrip_preserves_entries_and_links() {
        let ledger = sealed_ledger();
        let manifest = ledger.to_manifest().unwrap();

        let bytes = manifest.to_bytes().unwrap();
        let parsed = Manifest::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, manifest);

        for (original, reloaded) in manifest.entries.iter().zip(&parsed.entries) {
            assert_eq!(
                original.recompute_link().unwrap(),
                reloaded.recompute_link().unwrap()
            );
        }
    }

    #[test]
    fn garbage_bytes_are_malformed() {
        let err = Manifest::from_bytes(b"not a manifest").unwrap_err();
        assert!(matches!(err, LedgerError::MalformedManifest { .. }));
    }

    #[test]
    fn missing_fields_are_malformed() {
        let err = Manifest::from_bytes(br#"{"schema_version": "1"}"#).unwrap_err();
        assert!(matches!(err, LedgerError::MalformedManifest { .. }));
    }

    #[test]
    fn unknown_schema_version_is_malformed() {
        let ledger = sealed_ledger();
        let mut manifest = ledger.to_manifest().unwrap();
        manifest.schema_version = "99".into();
        let err = Manifest::from_bytes(&manifest.to_bytes().unwrap()).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::MalformedManifest { reason } if reason.contains("schema version")
        ));
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifests").join("case-9.json");

        let manifest = sealed_ledger().to_manifest().unwrap();
        manifest.save(&path).unwrap();
        let loaded = Manifest::load(&path).unwrap();
        assert_eq!(loaded, manifest);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = Manifest::load(Path::new("/nonexistent/custodia/manifest.json")).unwrap_err();
        assert!(matches!(err, LedgerError::Io(_)));
    }

    #[test]
    fn rehydrated_ledger_is_sealed_and_identical() {
        let ledger = sealed_ledger();
        let manifest = ledger.to_manifest().unwrap();
        let terminal = manifest.terminal_link;

        let rehydrated = manifest.into_ledger();
        assert!(rehydrated.is_sealed().unwrap());
        assert_eq!(rehydrated.terminal_link().unwrap(), terminal);
        assert_eq!(rehydrated.entries().unwrap(), ledger.entries().unwrap());
        assert!(matches!(
            rehydrated.append(EntryInput::from_parts(
                EvidenceMetadata::new(
                    EvidenceId::new("late").unwrap(),
                    SourceDescriptor::new("aws", "s3"),
                    "/late",
                ),
                Default::default(),
                0,
            )),
            Err(LedgerError::Sealed)
        ));
    }
}
