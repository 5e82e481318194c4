//! Foundation types for Custodia, the evidence integrity ledger.
//!
//! This crate provides the identifier, digest, and metadata types shared by
//! every other Custodia crate. It holds no I/O and no hashing logic of its
//! own; it only defines the shapes that the digest engine, the custody
//! ledger, and the verifier agree on.
//!
//! # Key Types
//!
//! - [`CaseId`] / [`EvidenceId`] — Opaque, non-empty identifiers
//! - [`DigestAlgorithm`] — The closed set of supported fingerprint algorithms
//! - [`Digest`] — An algorithm tag paired with its fixed-length output
//! - [`LinkHash`] — The 32-byte per-entry chain link (BLAKE3 output)
//! - [`SourceDescriptor`] / [`EvidenceMetadata`] — Collector-supplied
//!   provenance, carried but never trusted as tamper-proof on its own

pub mod case;
pub mod digest;
pub mod error;
pub mod link;
pub mod meta;

pub use case::{CaseId, EvidenceId};
pub use digest::{Digest, DigestAlgorithm};
pub use error::TypeError;
pub use link::LinkHash;
pub use meta::{EvidenceMetadata, SourceDescriptor};
