//! Storage for the vis version ledger.
//!
//! A ledger store maps record ids to [`VersionRecord`](vis_types::VersionRecord)s
//! and exposes the handful of primitives the ledger state machine needs:
//! insert, conditional commit, point lookup, slot resolution, and slot
//! deletion.
//!
//! # Storage Backends
//!
//! All backends implement the [`LedgerStore`] trait:
//!
//! - [`InMemoryLedgerStore`] -- `BTreeMap`-based store for tests and embedding
//! - [`SqliteLedgerStore`] -- relational store with a status column
//!
//! # Design Rules
//!
//! 1. Records are append-only; the only in-place change is `staged -> committed`.
//! 2. The staged check and the committed write happen under one lock or one
//!    SQL statement.
//! 3. "Current" means the committed record with the greatest id.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod memory;
pub mod sqlite;
pub mod traits;

#[cfg(test)]
mod conformance;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryLedgerStore;
pub use sqlite::{SqliteLedgerStore, SqliteOptions, DEFAULT_BUSY_TIMEOUT};
pub use traits::LedgerStore;
