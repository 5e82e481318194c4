use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::PathBuf;

use custodia_types::EvidenceMetadata;

/// The one capability a collector must provide: a byte stream plus
/// metadata.
///
/// Provider-specific acquisition logic (cloud APIs, container runtimes,
/// pagination, auth) lives entirely behind this seam; the core only ever
/// sees opaque bytes and descriptive metadata. `open` may be called more
/// than once and must yield the same bytes each time for stored artifacts.
pub trait EvidenceSource: Send + Sync {
    /// Descriptive metadata for this piece of evidence.
    fn metadata(&self) -> &EvidenceMetadata;

    /// Open the evidence bytes for reading.
    fn open(&self) -> io::Result<Box<dyn Read + '_>>;
}

/// Evidence stored as a file on the local filesystem.
///
/// The common case after acquisition: a collector lands bytes on disk and
/// hands the path to the ledger pipeline.
pub struct FileEvidence {
    metadata: EvidenceMetadata,
    path: PathBuf,
}

impl FileEvidence {
    /// Evidence backed by the path recorded in the metadata's `location`.
    pub fn from_metadata(metadata: EvidenceMetadata) -> Self {
        let path = PathBuf::from(&metadata.location);
        Self { metadata, path }
    }

    /// Evidence backed by an explicit path (when the stored location is
    /// not a local path).
    pub fn new(metadata: EvidenceMetadata, path: impl Into<PathBuf>) -> Self {
        Self {
            metadata,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl EvidenceSource for FileEvidence {
    fn metadata(&self) -> &EvidenceMetadata {
        &self.metadata
    }

    fn open(&self) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(BufReader::new(File::open(&self.path)?)))
    }
}

#[cfg(test)]
mod tests {
    use custodia_types::{DigestAlgorithm, EvidenceId, SourceDescriptor};

    use crate::engine::DigestEngine;

    use super::*;

    #[test]
    fn file_evidence_streams_file_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.log");
        std::fs::write(&path, b"log line one\nlog line two\n").unwrap();

        let meta = EvidenceMetadata::new(
            EvidenceId::new("audit-log").unwrap(),
            SourceDescriptor::new("docker", "container-logs"),
            path.to_string_lossy(),
        );
        let evidence = FileEvidence::from_metadata(meta);

        let set = DigestEngine::new()
            .digest_stream(evidence.open().unwrap(), &[DigestAlgorithm::Sha256])
            .unwrap();
        let direct = DigestEngine::new()
            .digest_file(&path, &[DigestAlgorithm::Sha256])
            .unwrap();
        assert_eq!(set, direct);
        assert_eq!(evidence.metadata().evidence_id.as_str(), "audit-log");
    }

    #[test]
    fn open_missing_file_is_io_error() {
        let meta = EvidenceMetadata::new(
            EvidenceId::new("gone").unwrap(),
            SourceDescriptor::new("fs", "file"),
            "/nonexistent/custodia/evidence",
        );
        let evidence = FileEvidence::from_metadata(meta);
        assert!(evidence.open().is_err());
    }
}
