//! Append-only custody ledger for Custodia.
//!
//! This crate is the heart of the system. It provides:
//! - [`LedgerEntry`] — the immutable, hash-linked record of one piece of
//!   acquired evidence
//! - [`CustodyLedger`] — the ordered, append-only entry sequence for one
//!   case, with sealing and thread-safe appends
//! - [`Manifest`] — the durable serialized form of a sealed ledger
//! - [`NotarySink`] — the one-way, best-effort external notarization seam
//!
//! # Design Rules
//!
//! 1. Entries are immutable once appended; the ledger interface exposes no
//!    mutation or removal.
//! 2. `link` is a pure function of an entry's chained fields and
//!    `prev_link`; it is always recomputable, never trusted as stored.
//! 3. Sequence numbers are contiguous from 0; `prev_link` of entry n is
//!    the `link` of entry n-1, or the ledger's genesis for n=0.
//! 4. The sequence counter and terminal link are one unit of shared state,
//!    guarded by one exclusive lock. Digesting happens before `append`,
//!    outside the critical section.
//! 5. Entry order is lock-admission order: it reflects when fingerprinting
//!    completed, not when acquisition began.
//! 6. Manifest loading never validates the chain; that is the verifier's
//!    job, keeping load cheap and side-effect-free.

pub mod entry;
pub mod error;
pub mod ledger;
pub mod manifest;
pub mod notary;

pub use entry::{EntryInput, LedgerEntry};
pub use error::LedgerError;
pub use ledger::CustodyLedger;
pub use manifest::{Manifest, MANIFEST_SCHEMA_VERSION};
pub use notary::{NotaryError, NotarySink, TracingNotary};
