use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::object_id::ObjectId;
use crate::version::VersionType;

/// Visibility state of a ledger record.
///
/// Transitions are `Staged -> Committed` and `Staged -> RolledBack`; both
/// targets are terminal. Stores never persist `RolledBack`: a rolled-back
/// record is simply absent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordStatus {
    Staged,
    Committed,
    RolledBack,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Staged => "staged",
            Self::Committed => "committed",
            Self::RolledBack => "rolled-back",
        }
    }

    /// Returns `true` if no further transition is allowed.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Staged)
    }
}

impl FromStr for RecordStatus {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "staged" => Ok(Self::Staged),
            "committed" => Ok(Self::Committed),
            "rolled-back" => Ok(Self::RolledBack),
            other => Err(TypeError::UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The slot a record occupies: resolution and rollback address slots.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotKey {
    pub namespace: String,
    pub repo_id: String,
    pub version_type: VersionType,
}

impl SlotKey {
    pub fn new(
        namespace: impl Into<String>,
        repo_id: impl Into<String>,
        version_type: VersionType,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            repo_id: repo_id.into(),
            version_type,
        }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.namespace, self.repo_id, self.version_type)
    }
}

/// One entry in the version ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub id: ObjectId,
    pub namespace: String,
    pub repo_id: String,
    pub version_type: VersionType,
    pub value: String,
    pub status: RecordStatus,
    pub created: DateTime<Utc>,
}

impl VersionRecord {
    /// The slot this record belongs to.
    pub fn key(&self) -> SlotKey {
        SlotKey::new(&self.namespace, &self.repo_id, self.version_type)
    }

    /// Returns `true` if the record occupies `key`.
    pub fn matches(&self, key: &SlotKey) -> bool {
        self.namespace == key.namespace
            && self.repo_id == key.repo_id
            && self.version_type == key.version_type
    }

    pub fn is_committed(&self) -> bool {
        self.status == RecordStatus::Committed
    }
}

/// Committed activity of one (namespace, repository) pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSummary {
    pub namespace: String,
    pub repo_id: String,
    #[serde(rename = "cnt_release")]
    pub release_count: u64,
    #[serde(rename = "cnt_development")]
    pub development_count: u64,
    #[serde(rename = "cnt_nightly")]
    pub nightly_count: u64,
    #[serde(rename = "cnt_patch")]
    pub patch_count: u64,
    /// Creation time of the newest committed record, any type.
    pub last_updated: Option<DateTime<Utc>>,
    /// Value of the newest committed record, any type.
    pub last_value: Option<String>,
    #[serde(skip)]
    last_id: Option<ObjectId>,
}

impl RepoSummary {
    pub fn new(namespace: impl Into<String>, repo_id: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            repo_id: repo_id.into(),
            release_count: 0,
            development_count: 0,
            nightly_count: 0,
            patch_count: 0,
            last_updated: None,
            last_value: None,
            last_id: None,
        }
    }

    /// Fold a committed record into the summary. Staged records are ignored.
    pub fn observe(&mut self, record: &VersionRecord) {
        if !record.is_committed() {
            return;
        }
        *self.count_mut(record.version_type) += 1;
        if self.last_id.map_or(true, |last| record.id > last) {
            self.last_id = Some(record.id);
            self.last_updated = Some(record.created);
            self.last_value = Some(record.value.clone());
        }
    }

    /// Committed records of one type.
    pub fn count(&self, version_type: VersionType) -> u64 {
        match version_type {
            VersionType::Release => self.release_count,
            VersionType::Development => self.development_count,
            VersionType::Nightly => self.nightly_count,
            VersionType::Patch => self.patch_count,
        }
    }

    pub fn set_count(&mut self, version_type: VersionType, count: u64) {
        *self.count_mut(version_type) = count;
    }

    /// Record the newest committed entry directly, when a backend computes
    /// it without folding every record.
    pub fn set_latest(&mut self, id: ObjectId, created: DateTime<Utc>, value: impl Into<String>) {
        self.last_id = Some(id);
        self.last_updated = Some(created);
        self.last_value = Some(value.into());
    }

    /// Total committed records across all types.
    pub fn total(&self) -> u64 {
        VersionType::ALL.iter().map(|t| self.count(*t)).sum()
    }

    fn count_mut(&mut self, version_type: VersionType) -> &mut u64 {
        match version_type {
            VersionType::Release => &mut self.release_count,
            VersionType::Development => &mut self.development_count,
            VersionType::Nightly => &mut self.nightly_count,
            VersionType::Patch => &mut self.patch_count,
        }
    }
}
