//! Streaming digest engine for Custodia.
//!
//! Fingerprints evidence byte streams without ever requiring the whole
//! artifact in memory: the stream is consumed exactly once in bounded-size
//! chunks, feeding every requested algorithm in the same pass.
//!
//! # Design Rules
//!
//! 1. Identical bytes and identical algorithm sets always yield
//!    bit-identical digests. The chain of custody rests on this.
//! 2. A stream that errors mid-read produces no digests at all; partial
//!    results are discarded, never surfaced as valid.
//! 3. The engine has no side effects beyond consuming the stream.
//!
//! The [`EvidenceSource`] trait is the one capability collectors implement:
//! produce a byte stream plus metadata. The core never depends on
//! provider-specific types.

pub mod engine;
pub mod error;
pub mod source;

pub use engine::{DigestEngine, DigestSet, DEFAULT_CHUNK_SIZE};
pub use error::DigestError;
pub use source::{EvidenceSource, FileEvidence};
