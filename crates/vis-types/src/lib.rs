//! Foundation types for vis, the version information service.
//!
//! Every other vis crate depends on `vis-types`.
//!
//! # Key Types
//!
//! - [`ObjectId`] -- 12-byte time-ordered record identifier
//! - [`ObjectIdGenerator`] -- process-local minting of [`ObjectId`]s
//! - [`VersionType`] -- closed set of tracked version classes
//! - [`RecordStatus`] -- staged / committed / rolled-back
//! - [`VersionRecord`] -- one ledger entry
//! - [`SlotKey`] -- the (namespace, repository, type) key a record lives under

pub mod badge;
pub mod error;
pub mod object_id;
pub mod record;
pub mod version;

pub use badge::{badge_color, DEFAULT_BADGE_COLOR};
pub use error::TypeError;
pub use object_id::{MachineIdentity, ObjectId, ObjectIdGenerator};
pub use record::{RecordStatus, RepoSummary, SlotKey, VersionRecord};
pub use version::{VersionType, DEFAULT_VERSION_TYPE};
