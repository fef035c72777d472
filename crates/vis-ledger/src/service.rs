use std::sync::Arc;

use chrono::Utc;
use vis_store::{InMemoryLedgerStore, LedgerStore};
use vis_types::{
    ObjectId, ObjectIdGenerator, RecordStatus, RepoSummary, SlotKey, VersionRecord, VersionType,
};

use crate::error::{LedgerError, LedgerResult};
use crate::request::{PrepareRequest, ResolveQuery, RollbackRequest};
use crate::validation;

/// Namespace used when a read omits one.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Placeholder shown when a slot has nothing committed.
pub const NOT_AVAILABLE: &str = "n/a";

/// The version ledger.
///
/// Owns the record state machine and delegates persistence to a
/// [`LedgerStore`]. Cheap to share behind an `Arc`; every method takes
/// `&self` and blocks on the store.
#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn LedgerStore>,
    ids: Arc<ObjectIdGenerator>,
}

impl LedgerService {
    pub fn new(store: Arc<dyn LedgerStore>, ids: Arc<ObjectIdGenerator>) -> Self {
        Self { store, ids }
    }

    /// A service over a fresh [`InMemoryLedgerStore`].
    pub fn in_memory(ids: ObjectIdGenerator) -> Self {
        Self::new(Arc::new(InMemoryLedgerStore::new()), Arc::new(ids))
    }

    /// Stage a new version value, or write it committed when
    /// `auto_commit` is set. Returns the transaction id.
    pub fn prepare(&self, request: &PrepareRequest) -> LedgerResult<ObjectId> {
        let key = validation::slot(
            &request.namespace,
            &request.repo_id,
            request.version_type.as_deref(),
        )?;
        let value = validation::required("version", &request.value)?;

        let status = if request.auto_commit {
            RecordStatus::Committed
        } else {
            RecordStatus::Staged
        };
        let record = VersionRecord {
            id: self.ids.generate(),
            namespace: key.namespace,
            repo_id: key.repo_id,
            version_type: key.version_type,
            value,
            status,
            created: Utc::now(),
        };
        self.store.insert(&record)?;

        tracing::info!(
            id = %record.id,
            slot = %record.key(),
            value = %record.value,
            status = %record.status,
            "version prepared"
        );
        Ok(record.id)
    }

    /// Publish a staged record.
    ///
    /// Fails with [`LedgerError::NotFound`] if the id is unknown, already
    /// committed, or was rolled back.
    pub fn commit(&self, id: &ObjectId) -> LedgerResult<()> {
        if !self.store.commit_staged(id)? {
            tracing::debug!(id = %id, "commit target not staged");
            return Err(LedgerError::NotFound(*id));
        }
        tracing::info!(id = %id, "version committed");
        Ok(())
    }

    /// [`commit`](Self::commit) with a transaction id as received on the wire.
    ///
    /// Only a blank id is a validation error; an id that does not parse is
    /// not found, the same as a well-formed id nothing matches.
    pub fn commit_hex(&self, raw: &str) -> LedgerResult<()> {
        let id = validation::tx_id(raw)?;
        self.commit(&id)
    }

    /// Delete every record of a slot, staged or committed. Returns the
    /// number removed; removing nothing is not an error.
    pub fn rollback(&self, request: &RollbackRequest) -> LedgerResult<u64> {
        let key = validation::slot(
            &request.namespace,
            &request.repo_id,
            request.version_type.as_deref(),
        )?;
        let removed = self.store.delete_slot(&key)?;
        tracing::info!(slot = %key, removed, "slot rolled back");
        Ok(removed)
    }

    /// Current committed value of a slot.
    ///
    /// `Ok(None)` when nothing is committed, or when the type is not a
    /// known class; the latter never reaches the store.
    pub fn resolve(&self, query: &ResolveQuery) -> LedgerResult<Option<String>> {
        let repo_id = validation::required("repo", &query.repo_id)?;
        let namespace = match query.namespace.as_deref().map(str::trim) {
            Some(ns) if !ns.is_empty() => ns.to_string(),
            _ => DEFAULT_NAMESPACE.to_string(),
        };
        let version_type = match VersionType::parse_or_default(query.version_type.as_deref()) {
            Ok(t) => t,
            Err(err) => {
                tracing::debug!(error = %err, "resolve with unknown version type");
                return Ok(None);
            }
        };

        let key = SlotKey::new(namespace, repo_id, version_type);
        let current = self.store.latest_committed(&key)?;
        tracing::debug!(slot = %key, found = current.is_some(), "resolved");
        Ok(current.map(|record| record.value))
    }

    /// [`resolve`](Self::resolve), with [`NOT_AVAILABLE`] standing in for
    /// an empty slot.
    pub fn resolve_or_placeholder(&self, query: &ResolveQuery) -> LedgerResult<String> {
        Ok(self
            .resolve(query)?
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()))
    }

    /// Point lookup of a record by transaction id, any status.
    pub fn record(&self, id: &ObjectId) -> LedgerResult<Option<VersionRecord>> {
        Ok(self.store.get(id)?)
    }

    /// Committed activity per (namespace, repository), ordered by key.
    pub fn summaries(&self) -> LedgerResult<Vec<RepoSummary>> {
        Ok(self.store.summaries()?)
    }
}

impl std::fmt::Debug for LedgerService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerService")
            .field("ids", &self.ids)
            .finish_non_exhaustive()
    }
}
