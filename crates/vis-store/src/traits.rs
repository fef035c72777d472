use vis_types::{ObjectId, RepoSummary, SlotKey, VersionRecord};

use crate::error::StoreResult;

/// Storage capabilities the version ledger is built on.
///
/// Backends provide only these primitives; the prepare / commit / rollback
/// state machine lives in the ledger service. All implementations must
/// satisfy:
/// - `commit_staged` is a single atomic conditional update. No caller ever
///   reads the status and writes it back in two steps.
/// - Once `commit_staged` returns `true`, every later `latest_committed`
///   for that slot observes the record (or a newer one).
/// - Committed records are never modified; only `delete_slot` removes them.
/// - Storage failures are errors; absence is `Ok(None)` / `Ok(false)`.
pub trait LedgerStore: Send + Sync {
    /// Append a new record. Fails with `DuplicateId` if the id exists.
    fn insert(&self, record: &VersionRecord) -> StoreResult<()>;

    /// Transition `id` from staged to committed.
    ///
    /// Returns `false` when no staged record with this id exists (unknown,
    /// already committed, or rolled back).
    fn commit_staged(&self, id: &ObjectId) -> StoreResult<bool>;

    /// Point lookup by id.
    fn get(&self, id: &ObjectId) -> StoreResult<Option<VersionRecord>>;

    /// The committed record with the greatest id in `key`.
    fn latest_committed(&self, key: &SlotKey) -> StoreResult<Option<VersionRecord>>;

    /// Remove every record in `key`, whatever its status. Returns the number
    /// of records removed.
    fn delete_slot(&self, key: &SlotKey) -> StoreResult<u64>;

    /// Per (namespace, repository) aggregate of committed records, ordered
    /// by namespace then repository.
    fn summaries(&self) -> StoreResult<Vec<RepoSummary>>;
}
