use std::collections::{BTreeMap, btree_map::Entry};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use vis_types::{ObjectId, RecordStatus, RepoSummary, SlotKey, VersionRecord};

use crate::error::{StoreError, StoreResult};
use crate::traits::LedgerStore;

/// In-memory, `BTreeMap`-based ledger store.
///
/// Intended for tests and embedding. Records are keyed by id, so iteration
/// order is id order and the newest record of a slot is found by scanning
/// from the back.
pub struct InMemoryLedgerStore {
    records: RwLock<BTreeMap<ObjectId, VersionRecord>>,
}

impl InMemoryLedgerStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of records currently stored, any status.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.read_lock()?.len())
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    fn read_lock(&self) -> StoreResult<RwLockReadGuard<'_, BTreeMap<ObjectId, VersionRecord>>> {
        self.records.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write_lock(&self) -> StoreResult<RwLockWriteGuard<'_, BTreeMap<ObjectId, VersionRecord>>> {
        self.records.write().map_err(|_| StoreError::LockPoisoned)
    }
}

impl Default for InMemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn insert(&self, record: &VersionRecord) -> StoreResult<()> {
        validate_insert(record)?;
        let mut map = self.write_lock()?;
        match map.entry(record.id) {
            Entry::Occupied(_) => Err(StoreError::DuplicateId(record.id)),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(())
            }
        }
    }

    fn commit_staged(&self, id: &ObjectId) -> StoreResult<bool> {
        let mut map = self.write_lock()?;
        match map.get_mut(id) {
            Some(record) if !record.status.is_terminal() => {
                record.status = RecordStatus::Committed;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn get(&self, id: &ObjectId) -> StoreResult<Option<VersionRecord>> {
        Ok(self.read_lock()?.get(id).cloned())
    }

    fn latest_committed(&self, key: &SlotKey) -> StoreResult<Option<VersionRecord>> {
        let map = self.read_lock()?;
        Ok(map
            .values()
            .rev()
            .find(|r| r.is_committed() && r.matches(key))
            .cloned())
    }

    fn delete_slot(&self, key: &SlotKey) -> StoreResult<u64> {
        let mut map = self.write_lock()?;
        let before = map.len();
        map.retain(|_, r| !r.matches(key));
        Ok((before - map.len()) as u64)
    }

    fn summaries(&self) -> StoreResult<Vec<RepoSummary>> {
        let map = self.read_lock()?;
        let mut by_repo: BTreeMap<(String, String), RepoSummary> = BTreeMap::new();
        for record in map.values().filter(|r| r.is_committed()) {
            by_repo
                .entry((record.namespace.clone(), record.repo_id.clone()))
                .or_insert_with(|| RepoSummary::new(&record.namespace, &record.repo_id))
                .observe(record);
        }
        Ok(by_repo.into_values().collect())
    }
}

impl std::fmt::Debug for InMemoryLedgerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryLedgerStore")
            .field("record_count", &self.len().ok())
            .finish()
    }
}

/// Checks shared by every backend before a record is written.
pub(crate) fn validate_insert(record: &VersionRecord) -> StoreResult<()> {
    if record.id.is_null() {
        return Err(StoreError::NullObjectId);
    }
    if record.status == RecordStatus::RolledBack {
        return Err(StoreError::InvalidRecord {
            id: record.id,
            reason: "rolled-back records are not persisted".into(),
        });
    }
    Ok(())
}
