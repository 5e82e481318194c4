use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The per-entry chain link: a 32-byte BLAKE3 output binding a ledger entry
/// to its predecessor.
///
/// `LinkHash` is a plain value type; the link computation itself lives with
/// the ledger entry so that the canonical payload and the hash stay in one
/// place. The all-zero value is the genesis constant: the `prev_link` of
/// entry 0, and the terminal link of a ledger that sealed with no entries.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkHash([u8; 32]);

impl LinkHash {
    /// The genesis constant (all zeros).
    pub const GENESIS: Self = Self([0u8; 32]);

    /// Wrap a pre-computed 32-byte hash.
    pub const fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    /// Returns `true` if this is the genesis constant.
    pub fn is_genesis(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// The raw 32-byte hash.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters), for logs.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for LinkHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LinkHash({})", self.short_hex())
    }
}

impl fmt::Display for LinkHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<[u8; 32]> for LinkHash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<LinkHash> for [u8; 32] {
    fn from(link: LinkHash) -> Self {
        link.0
    }
}

// Manifests store links as hex strings so they stay human-auditable.
impl Serialize for LinkHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for LinkHash {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn genesis_is_all_zeros() {
        assert!(LinkHash::GENESIS.is_genesis());
        assert_eq!(LinkHash::GENESIS.as_bytes(), &[0u8; 32]);
    }

    #[test]
    fn hex_roundtrip() {
        let link = LinkHash::from_hash([0x5a; 32]);
        let parsed = LinkHash::from_hex(&link.to_hex()).unwrap();
        assert_eq!(parsed, link);
    }

    #[test]
    fn from_hex_rejects_wrong_length() {
        let err = LinkHash::from_hex("abcd").unwrap_err();
        assert_eq!(
            err,
            TypeError::InvalidLength {
                expected: 32,
                actual: 2
            }
        );
    }

    #[test]
    fn from_hex_rejects_non_hex() {
        assert!(matches!(
            LinkHash::from_hex("zz").unwrap_err(),
            TypeError::InvalidHex(_)
        ));
    }

    #[test]
    fn serde_is_hex_string() {
        let link = LinkHash::from_hash([0x11; 32]);
        let json = serde_json::to_string(&link).unwrap();
        assert_eq!(json, format!("\"{}\"", "11".repeat(32)));
        let parsed: LinkHash = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, link);
    }

    #[test]
    fn short_hex_is_8_chars() {
        assert_eq!(LinkHash::from_hash([0xff; 32]).short_hex().len(), 8);
    }

    proptest! {
        #[test]
        fn hex_roundtrip_for_any_hash(bytes in any::<[u8; 32]>()) {
            let link = LinkHash::from_hash(bytes);
            let parsed = LinkHash::from_hex(&link.to_hex()).unwrap();
            prop_assert_eq!(parsed, link);
        }

        #[test]
        fn serde_roundtrip_for_any_hash(bytes in any::<[u8; 32]>()) {
            let link = LinkHash::from_hash(bytes);
            let json = serde_json::to_string(&link).unwrap();
            let parsed: LinkHash = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(parsed, link);
        }
    }
}
