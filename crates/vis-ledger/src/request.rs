use serde::{Deserialize, Serialize};

/// Input to [`LedgerService::prepare`](crate::LedgerService::prepare).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepareRequest {
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub repo_id: String,
    /// Omitted or blank means [`DEFAULT_VERSION_TYPE`](vis_types::DEFAULT_VERSION_TYPE).
    #[serde(default)]
    pub version_type: Option<String>,
    #[serde(default, rename = "version")]
    pub value: String,
    /// Write the record as committed, skipping the two-phase flow.
    #[serde(default)]
    pub auto_commit: bool,
}

impl PrepareRequest {
    pub fn new(
        namespace: impl Into<String>,
        repo_id: impl Into<String>,
        version_type: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            repo_id: repo_id.into(),
            version_type: Some(version_type.into()),
            value: value.into(),
            auto_commit: false,
        }
    }

    pub fn auto_commit(mut self) -> Self {
        self.auto_commit = true;
        self
    }
}

/// Input to [`LedgerService::rollback`](crate::LedgerService::rollback).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackRequest {
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub repo_id: String,
    #[serde(default)]
    pub version_type: Option<String>,
}

impl RollbackRequest {
    pub fn new(
        namespace: impl Into<String>,
        repo_id: impl Into<String>,
        version_type: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            repo_id: repo_id.into(),
            version_type: Some(version_type.into()),
        }
    }
}

/// Read-side lookup. Every field is user supplied and may be blank.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveQuery {
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default, alias = "repo")]
    pub repo_id: String,
    #[serde(default)]
    pub version_type: Option<String>,
}

impl ResolveQuery {
    pub fn new(
        namespace: impl Into<String>,
        repo_id: impl Into<String>,
        version_type: impl Into<String>,
    ) -> Self {
        Self {
            namespace: Some(namespace.into()),
            repo_id: repo_id.into(),
            version_type: Some(version_type.into()),
        }
    }

    /// The type label as the caller wrote it, or the default class name.
    pub fn type_label(&self) -> String {
        match self.version_type.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => vis_types::DEFAULT_VERSION_TYPE.to_string(),
        }
    }
}
