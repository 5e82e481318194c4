use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Supported content digest algorithms.
///
/// SHA-256 is the conventional forensic baseline; SHA-512 is the usual
/// second fingerprint recorded alongside it. BLAKE3 is offered for
/// high-throughput acquisitions. Adding an algorithm must never change how
/// previously recorded digests are interpreted, so each variant carries a
/// fixed, documented output length.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    Sha256,
    Sha512,
    Blake3,
}

impl DigestAlgorithm {
    /// Output length in bytes.
    pub const fn output_len(&self) -> usize {
        match self {
            Self::Sha256 => 32,
            Self::Sha512 => 64,
            Self::Blake3 => 32,
        }
    }

    /// Canonical lowercase name, as stored in manifests.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
            Self::Blake3 => "blake3",
        }
    }

    /// All supported algorithms.
    pub const ALL: [Self; 3] = [Self::Sha256, Self::Sha512, Self::Blake3];
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" => Ok(Self::Sha256),
            "sha512" => Ok(Self::Sha512),
            "blake3" => Ok(Self::Blake3),
            other => Err(TypeError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// A cryptographic fingerprint: an algorithm paired with its output.
///
/// Immutable once computed. Recomputation from the same bytes is
/// byte-for-byte reproducible; this property is what the whole chain of
/// custody rests on.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Digest {
    pub algorithm: DigestAlgorithm,
    /// Raw digest output, hex-encoded in serialized form.
    #[serde(with = "hex_bytes")]
    pub value: Vec<u8>,
}

impl Digest {
    /// Create a digest, enforcing the algorithm's output length.
    pub fn new(algorithm: DigestAlgorithm, value: Vec<u8>) -> Result<Self, TypeError> {
        if value.len() != algorithm.output_len() {
            return Err(TypeError::InvalidLength {
                expected: algorithm.output_len(),
                actual: value.len(),
            });
        }
        Ok(Self { algorithm, value })
    }

    /// Parse a digest from its hex representation.
    pub fn from_hex(algorithm: DigestAlgorithm, s: &str) -> Result<Self, TypeError> {
        let value = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        Self::new(algorithm, value)
    }

    /// Hex-encoded digest value.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.value)
    }

    /// Short hex representation (first 8 characters), for logs.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.value[..4])
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({}:{})", self.algorithm, self.short_hex())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.to_hex())
    }
}

/// Serde adapter storing byte vectors as lowercase hex strings.
mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map_err(serde::de::Error::custom)
    }
}
