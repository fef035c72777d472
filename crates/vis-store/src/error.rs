use vis_types::ObjectId;

/// Errors from ledger store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A record with this id already exists. Ids are never reused.
    #[error("duplicate record id: {0}")]
    DuplicateId(ObjectId),

    /// Attempted to write a null object ID.
    #[error("cannot store record with null ID")]
    NullObjectId,

    /// The record cannot be persisted in its current form.
    #[error("invalid record {id}: {reason}")]
    InvalidRecord { id: ObjectId, reason: String },

    /// A persisted row could not be decoded.
    #[error("corrupt record {id}: {reason}")]
    Corrupt { id: String, reason: String },

    /// Error reported by the SQLite engine.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A thread panicked while holding the store lock.
    #[error("store lock poisoned")]
    LockPoisoned,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
