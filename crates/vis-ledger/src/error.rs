use vis_store::StoreError;
use vis_types::{ObjectId, TypeError};

/// Errors produced by ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Missing or malformed input. Raised before any storage access.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Commit target is unknown or no longer staged.
    #[error("transaction {0} does not exist or was already finalized")]
    NotFound(ObjectId),

    /// Commit target that cannot name any record; never reaches the store.
    #[error("transaction {0} does not exist or was already finalized")]
    UnknownTransaction(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl From<TypeError> for LedgerError {
    fn from(err: TypeError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
