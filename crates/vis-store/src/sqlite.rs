use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use vis_types::{ObjectId, RecordStatus, RepoSummary, SlotKey, VersionRecord, VersionType};

use crate::error::{StoreError, StoreResult};
use crate::memory::validate_insert;
use crate::traits::LedgerStore;

/// Default bound on how long a call waits for the database lock.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS versions (
    id             TEXT NOT NULL PRIMARY KEY,
    created        TEXT NOT NULL,
    status         TEXT NOT NULL DEFAULT 'staged',
    namespace      TEXT NOT NULL,
    repo_id        TEXT NOT NULL,
    version_type   TEXT NOT NULL,
    version_value  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS version_query
    ON versions (namespace, repo_id, version_type);
"#;

const RECORD_COLUMNS: &str =
    "id, created, status, namespace, repo_id, version_type, version_value";

/// Connection options for [`SqliteLedgerStore`].
#[derive(Clone, Debug)]
pub struct SqliteOptions {
    /// How long a statement waits on a locked database before failing.
    pub busy_timeout: Duration,
}

impl Default for SqliteOptions {
    fn default() -> Self {
        Self {
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }
}

/// Relational ledger store backed by SQLite.
///
/// One `versions` table keyed by record id, with a `status` column carrying
/// the state machine and a secondary index on the slot columns. Ids are
/// stored as fixed-width lowercase hex, so text order is id order.
pub struct SqliteLedgerStore {
    conn: Mutex<Connection>,
}

impl SqliteLedgerStore {
    /// Open (or create) a database file and ensure the schema exists.
    pub fn open(path: impl AsRef<Path>, options: &SqliteOptions) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(options.busy_timeout)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        tracing::debug!(path = %path.display(), "opened sqlite ledger store");
        Self::with_connection(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(mut conn: Connection) -> StoreResult<Self> {
        let tx = conn.transaction()?;
        tx.execute_batch(SCHEMA)?;
        tx.commit()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

impl LedgerStore for SqliteLedgerStore {
    fn insert(&self, record: &VersionRecord) -> StoreResult<()> {
        validate_insert(record)?;
        let conn = self.lock()?;
        let result = conn.execute(
            "INSERT INTO versions (id, created, status, namespace, repo_id, version_type, version_value)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.id.to_hex(),
                record.created,
                record.status.as_str(),
                record.namespace,
                record.repo_id,
                record.version_type.as_str(),
                record.value,
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::DuplicateId(record.id))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn commit_staged(&self, id: &ObjectId) -> StoreResult<bool> {
        let conn = self.lock()?;
        let affected = conn.execute(
            "UPDATE versions SET status = ?1 WHERE id = ?2 AND status = ?3",
            params![
                RecordStatus::Committed.as_str(),
                id.to_hex(),
                RecordStatus::Staged.as_str(),
            ],
        )?;
        Ok(affected == 1)
    }

    fn get(&self, id: &ObjectId) -> StoreResult<Option<VersionRecord>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                &format!("SELECT {RECORD_COLUMNS} FROM versions WHERE id = ?1"),
                params![id.to_hex()],
                RawRecord::from_row,
            )
            .optional()?;
        row.map(RawRecord::decode).transpose()
    }

    fn latest_committed(&self, key: &SlotKey) -> StoreResult<Option<VersionRecord>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                &format!(
                    "SELECT {RECORD_COLUMNS} FROM versions
                     WHERE namespace = ?1 AND repo_id = ?2 AND version_type = ?3 AND status = ?4
                     ORDER BY id DESC LIMIT 1"
                ),
                params![
                    key.namespace,
                    key.repo_id,
                    key.version_type.as_str(),
                    RecordStatus::Committed.as_str(),
                ],
                RawRecord::from_row,
            )
            .optional()?;
        row.map(RawRecord::decode).transpose()
    }

    fn delete_slot(&self, key: &SlotKey) -> StoreResult<u64> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM versions WHERE namespace = ?1 AND repo_id = ?2 AND version_type = ?3",
            params![key.namespace, key.repo_id, key.version_type.as_str()],
        )?;
        Ok(removed as u64)
    }

    fn summaries(&self) -> StoreResult<Vec<RepoSummary>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT t.namespace, t.repo_id,
                    t.cnt_release, t.cnt_development, t.cnt_nightly, t.cnt_patch,
                    v.id, v.created, v.version_value
             FROM (
                SELECT namespace, repo_id,
                       SUM(CASE WHEN version_type = 'release' THEN 1 ELSE 0 END) AS cnt_release,
                       SUM(CASE WHEN version_type = 'development' THEN 1 ELSE 0 END) AS cnt_development,
                       SUM(CASE WHEN version_type = 'nightly' THEN 1 ELSE 0 END) AS cnt_nightly,
                       SUM(CASE WHEN version_type = 'patch' THEN 1 ELSE 0 END) AS cnt_patch,
                       MAX(id) AS last_id
                FROM versions
                WHERE status = 'committed'
                GROUP BY namespace, repo_id
             ) AS t
             JOIN versions v ON v.id = t.last_id
             ORDER BY t.namespace, t.repo_id",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                [
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, i64>(5)?,
                ],
                row.get::<_, String>(6)?,
                row.get::<_, DateTime<Utc>>(7)?,
                row.get::<_, String>(8)?,
            ))
        })?;

        let mut summaries = Vec::new();
        for row in rows {
            let (namespace, repo_id, counts, last_id, created, value) = row?;
            let id = parse_id(&last_id)?;
            let mut summary = RepoSummary::new(namespace, repo_id);
            for (version_type, count) in VersionType::ALL.into_iter().zip(counts) {
                summary.set_count(version_type, count.max(0) as u64);
            }
            summary.set_latest(id, created, value);
            summaries.push(summary);
        }
        Ok(summaries)
    }
}

impl std::fmt::Debug for SqliteLedgerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteLedgerStore").finish_non_exhaustive()
    }
}

/// A `versions` row before domain decoding.
struct RawRecord {
    id: String,
    created: DateTime<Utc>,
    status: String,
    namespace: String,
    repo_id: String,
    version_type: String,
    value: String,
}

impl RawRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            created: row.get(1)?,
            status: row.get(2)?,
            namespace: row.get(3)?,
            repo_id: row.get(4)?,
            version_type: row.get(5)?,
            value: row.get(6)?,
        })
    }

    fn decode(self) -> StoreResult<VersionRecord> {
        let id = parse_id(&self.id)?;
        let corrupt = |e: vis_types::TypeError| StoreError::Corrupt {
            id: self.id.clone(),
            reason: e.to_string(),
        };
        let status = self.status.parse::<RecordStatus>().map_err(corrupt)?;
        let version_type = self.version_type.parse::<VersionType>().map_err(corrupt)?;
        Ok(VersionRecord {
            id,
            namespace: self.namespace,
            repo_id: self.repo_id,
            version_type,
            value: self.value,
            status,
            created: self.created,
        })
    }
}

fn parse_id(raw: &str) -> StoreResult<ObjectId> {
    ObjectId::from_hex(raw).map_err(|e| StoreError::Corrupt {
        id: raw.to_string(),
        reason: e.to_string(),
    })
}
