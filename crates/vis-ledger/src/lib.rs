//! Version ledger for vis.
//!
//! This crate owns the record state machine:
//!
//! ```text
//!   prepare ──► staged ──commit──► committed
//!                  │
//!                  └──rollback──► (deleted)
//! ```
//!
//! - [`LedgerService`] -- prepare / commit / rollback / resolve over any
//!   [`LedgerStore`](vis_store::LedgerStore)
//! - [`PrepareRequest`], [`RollbackRequest`], [`ResolveQuery`] -- boundary inputs
//! - [`NOT_AVAILABLE`] -- placeholder rendered when nothing is committed

pub mod error;
pub mod request;
pub mod service;
pub mod validation;

pub use error::{LedgerError, LedgerResult};
pub use request::{PrepareRequest, ResolveQuery, RollbackRequest};
pub use service::{LedgerService, DEFAULT_NAMESPACE, NOT_AVAILABLE};
