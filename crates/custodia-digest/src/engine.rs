use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use sha2::{Digest as _, Sha256, Sha512};
use tracing::debug;

use custodia_types::{Digest, DigestAlgorithm};

use crate::error::DigestError;

/// Default read chunk size: 64 KiB.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// The digests of one artifact plus the byte count consumed computing them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DigestSet {
    digests: BTreeMap<DigestAlgorithm, Digest>,
    size_bytes: u64,
}

impl DigestSet {
    /// The digest for one algorithm, if it was requested.
    pub fn get(&self, algorithm: DigestAlgorithm) -> Option<&Digest> {
        self.digests.get(&algorithm)
    }

    /// Total bytes consumed from the stream.
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Number of digests computed.
    pub fn len(&self) -> usize {
        self.digests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }

    /// Consume into the algorithm → digest map.
    pub fn into_map(self) -> BTreeMap<DigestAlgorithm, Digest> {
        self.digests
    }

    /// The algorithm → digest map.
    pub fn as_map(&self) -> &BTreeMap<DigestAlgorithm, Digest> {
        &self.digests
    }
}

/// One incremental hasher state per algorithm.
enum HasherState {
    Sha256(Sha256),
    Sha512(Sha512),
    Blake3(Box<blake3::Hasher>),
}

impl HasherState {
    fn new(algorithm: DigestAlgorithm) -> Self {
        match algorithm {
            DigestAlgorithm::Sha256 => Self::Sha256(Sha256::new()),
            DigestAlgorithm::Sha512 => Self::Sha512(Sha512::new()),
            DigestAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, chunk: &[u8]) {
        match self {
            Self::Sha256(h) => h.update(chunk),
            Self::Sha512(h) => h.update(chunk),
            Self::Blake3(h) => {
                h.update(chunk);
            }
        }
    }

    fn finalize(self, algorithm: DigestAlgorithm) -> Digest {
        let value = match self {
            Self::Sha256(h) => h.finalize().to_vec(),
            Self::Sha512(h) => h.finalize().to_vec(),
            Self::Blake3(h) => h.finalize().as_bytes().to_vec(),
        };
        // Length is correct by construction for every variant.
        Digest::new(algorithm, value).expect("hasher output length matches algorithm")
    }
}

/// Streaming multi-algorithm digest engine.
///
/// Consumes a byte stream exactly once in `chunk_size` chunks, feeding
/// every requested algorithm in the same pass.
#[derive(Clone, Debug)]
pub struct DigestEngine {
    chunk_size: usize,
}

impl DigestEngine {
    /// Engine with the default 64 KiB chunk size.
    pub fn new() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Engine with an explicit chunk size (clamped to at least 1 byte).
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    /// Digest a byte stream with the requested algorithms.
    ///
    /// Duplicate algorithms are collapsed. Fails with
    /// [`DigestError::NoAlgorithms`] before any bytes are consumed if the
    /// set is empty, and with [`DigestError::ReadFailure`] if the stream
    /// errors mid-read (partial digests are discarded).
    pub fn digest_stream<R: Read>(
        &self,
        mut reader: R,
        algorithms: &[DigestAlgorithm],
    ) -> Result<DigestSet, DigestError> {
        let requested: BTreeSet<DigestAlgorithm> = algorithms.iter().copied().collect();
        if requested.is_empty() {
            return Err(DigestError::NoAlgorithms);
        }

        let mut hashers: Vec<(DigestAlgorithm, HasherState)> = requested
            .into_iter()
            .map(|algo| (algo, HasherState::new(algo)))
            .collect();

        let mut buf = vec![0u8; self.chunk_size];
        let mut size_bytes: u64 = 0;

        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            for (_, hasher) in &mut hashers {
                hasher.update(&buf[..n]);
            }
            size_bytes += n as u64;
        }

        let digests: BTreeMap<DigestAlgorithm, Digest> = hashers
            .into_iter()
            .map(|(algo, hasher)| (algo, hasher.finalize(algo)))
            .collect();

        debug!(size_bytes, algorithms = digests.len(), "stream digested");
        Ok(DigestSet { digests, size_bytes })
    }

    /// Digest in-memory bytes.
    pub fn digest_bytes(
        &self,
        data: &[u8],
        algorithms: &[DigestAlgorithm],
    ) -> Result<DigestSet, DigestError> {
        self.digest_stream(data, algorithms)
    }

    /// Digest a file's contents.
    pub fn digest_file(
        &self,
        path: &Path,
        algorithms: &[DigestAlgorithm],
    ) -> Result<DigestSet, DigestError> {
        let file = File::open(path)?;
        self.digest_stream(BufReader::new(file), algorithms)
    }

    /// Recompute one digest over a stream and compare against an expected
    /// value. `Ok(true)` means the bytes still match the fingerprint.
    pub fn verify_stream<R: Read>(
        &self,
        reader: R,
        expected: &Digest,
    ) -> Result<bool, DigestError> {
        let set = self.digest_stream(reader, &[expected.algorithm])?;
        Ok(set.get(expected.algorithm) == Some(expected))
    }
}

impl Default for DigestEngine {
    fn default() -> Self {
        Self::new()
    }
}
