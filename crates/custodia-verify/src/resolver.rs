use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;

use custodia_ledger::LedgerEntry;

/// Why an artifact could not be opened.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The artifact is not where the entry says it is. Distinct from
    /// alteration: absence and tampering are separate claims.
    #[error("artifact not found")]
    NotFound,

    /// The artifact exists but could not be opened or read.
    #[error("artifact unreadable: {0}")]
    Io(String),
}

/// Re-opens the bytes of a referenced evidence artifact.
///
/// Supplied by the caller so the verifier stays storage-agnostic: the core
/// neither knows nor cares whether evidence lives on a filesystem, in an
/// object store, or in memory.
pub trait ArtifactResolver: Send + Sync {
    fn open(&self, entry: &LedgerEntry) -> Result<Box<dyn Read + '_>, ResolveError>;
}

/// Resolver treating each entry's stored `location` as a filesystem path.
///
/// With a root configured, locations are re-anchored under it (the usual
/// case when an evidence tree has been moved since collection): leading
/// separators are stripped first, so an absolute stored location like
/// `/mnt/acq/img.dd` resolves to `<root>/mnt/acq/img.dd` rather than
/// escaping the root. Without a root, the location is used as-is.
pub struct FsResolver {
    root: Option<PathBuf>,
}

impl FsResolver {
    /// Resolve locations as stored.
    pub fn new() -> Self {
        Self { root: None }
    }

    /// Resolve locations relative to a root directory.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn path_for(&self, entry: &LedgerEntry) -> PathBuf {
        match &self.root {
            Some(root) => {
                // `join` would discard the root for absolute locations.
                let location = Path::new(&entry.location);
                let anchored = location
                    .components()
                    .filter(|c| matches!(c, std::path::Component::Normal(_)))
                    .collect::<PathBuf>();
                root.join(anchored)
            }
            None => PathBuf::from(&entry.location),
        }
    }
}

impl Default for FsResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ArtifactResolver for FsResolver {
    fn open(&self, entry: &LedgerEntry) -> Result<Box<dyn Read + '_>, ResolveError> {
        let path = self.path_for(entry);
        match File::open(&path) {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(ResolveError::NotFound),
            Err(e) => Err(ResolveError::Io(e.to_string())),
        }
    }
}

/// In-memory resolver keyed by evidence id, for tests and embedding.
#[derive(Default)]
pub struct MapResolver {
    artifacts: BTreeMap<String, Vec<u8>>,
}

impl MapResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an artifact's bytes under its evidence id.
    pub fn insert(&mut self, evidence_id: impl Into<String>, bytes: Vec<u8>) {
        self.artifacts.insert(evidence_id.into(), bytes);
    }

    /// Remove an artifact, simulating deletion.
    pub fn remove(&mut self, evidence_id: &str) -> Option<Vec<u8>> {
        self.artifacts.remove(evidence_id)
    }
}

impl ArtifactResolver for MapResolver {
    fn open(&self, entry: &LedgerEntry) -> Result<Box<dyn Read + '_>, ResolveError> {
        self.artifacts
            .get(entry.evidence_id.as_str())
            .map(|bytes| Box::new(bytes.as_slice()) as Box<dyn Read>)
            .ok_or(ResolveError::NotFound)
    }
}
