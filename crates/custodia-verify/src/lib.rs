//! Verifier for Custodia custody manifests.
//!
//! Given a persisted manifest and a resolver that can re-open the
//! referenced artifacts, the verifier replays the link chain and
//! re-fingerprints every artifact, producing a [`VerificationReport`].
//!
//! # Design Rules
//!
//! 1. Verification always completes and returns a report. Tampered
//!    evidence, missing artifacts, and broken chains are verdicts — data,
//!    not errors. Only an unreadable manifest is an error.
//! 2. Chain state and artifact state are independent claims: a chain break
//!    does not stop per-entry digest checks, and an altered artifact does
//!    not break the chain (the chain is a function of stored fields only).
//! 3. Evidence absence is not evidence alteration: `ArtifactMissing` is a
//!    distinct verdict from `DigestMismatch`.
//! 4. The verifier operates on an immutable, already-sealed snapshot and
//!    requires no locking. Verification is idempotent.

pub mod error;
pub mod report;
pub mod resolver;
pub mod verifier;

pub use error::VerifyError;
pub use report::{ChainStatus, EntryReport, EntryVerdict, VerificationReport};
pub use resolver::{ArtifactResolver, FsResolver, MapResolver, ResolveError};
pub use verifier::Verifier;
