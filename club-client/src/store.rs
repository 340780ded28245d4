//! Local durable store
//!
//! Per-device key/value persistence backed by redb. Every value is a JSON
//! document under a fixed key; reads tolerate both absence and corruption by
//! falling back to the caller's default.

use redb::{Database, ReadableDatabase, TableDefinition};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// key = store key, value = JSON
const KV_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("club_kv");

/// Durable keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    Session,
    Members,
    Points,
    Bookings,
    QuizAnswers,
    TicketCfg,
    PointsRules,
    Admin,
    SharedCache,
    SharedDirty,
    BackendDown,
    // Legacy layouts, read only by the migration
    LegacyEvent,
    LegacyBookings,
    LegacyEvents,
    LegacyQuiz,
}

impl StoreKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Session => "ics_session_v2",
            Self::Members => "ics_members_v2",
            Self::Points => "ics_points_v2",
            Self::Bookings => "ics_bookings_v3",
            Self::QuizAnswers => "ics_quiz_answers_v2",
            Self::TicketCfg => "ics_ticket_cfg_v2",
            Self::PointsRules => "ics_points_rules_v1",
            Self::Admin => "ics_admin_v2",
            Self::SharedCache => "ics_shared_cache_v1",
            Self::SharedDirty => "ics_shared_dirty_v1",
            Self::BackendDown => "ics_backend_down_v1",
            Self::LegacyEvent => "ics_event_v2",
            Self::LegacyBookings => "ics_bookings_v2",
            Self::LegacyEvents => "ics_events_v3",
            Self::LegacyQuiz => "ics_quiz_v2",
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Writes staged for [`LocalStore::save_many`]; a later write to the same
/// key wins.
#[derive(Debug, Default)]
pub struct StoreBatch {
    /// `None` removes the key
    writes: Vec<(StoreKey, Option<Vec<u8>>)>,
}

impl StoreBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save<T: Serialize + ?Sized>(&mut self, key: StoreKey, value: &T) -> StorageResult<()> {
        let bytes = serde_json::to_vec(value)?;
        self.writes.push((key, Some(bytes)));
        Ok(())
    }

    /// Same semantics as [`LocalStore::set_flag`]
    pub fn set_flag(&mut self, key: StoreKey, on: bool) -> StorageResult<()> {
        if on {
            self.save(key, &true)
        } else {
            self.writes.push((key, None));
            Ok(())
        }
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

/// Device-local key/value store
#[derive(Clone)]
pub struct LocalStore {
    db: Arc<Database>,
}

impl std::fmt::Debug for LocalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStore").finish_non_exhaustive()
    }
}

impl LocalStore {
    /// Open or create database
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open in-memory database (tests, ephemeral sessions)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db =
            Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(KV_TABLE)?;
        }
        write_txn.commit()?;
        Ok(Self { db: Arc::new(db) })
    }

    // ========== Raw access ==========

    pub fn get_raw(&self, key: StoreKey) -> StorageResult<Option<Vec<u8>>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(KV_TABLE)?;
        Ok(table.get(key.as_str())?.map(|guard| guard.value().to_vec()))
    }

    pub fn put_raw(&self, key: StoreKey, bytes: &[u8]) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(KV_TABLE)?;
            table.insert(key.as_str(), bytes)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Apply every staged write in one transaction; nothing lands on failure.
    pub fn save_many(&self, batch: StoreBatch) -> StorageResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(KV_TABLE)?;
            for (key, bytes) in &batch.writes {
                match bytes {
                    Some(bytes) => {
                        table.insert(key.as_str(), bytes.as_slice())?;
                    }
                    None => {
                        table.remove(key.as_str())?;
                    }
                }
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn contains(&self, key: StoreKey) -> bool {
        matches!(self.get_raw(key), Ok(Some(_)))
    }

    pub fn remove(&self, key: StoreKey) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(KV_TABLE)?;
            table.remove(key.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    // ========== Typed access ==========

    /// Read a value; `None` when absent or unreadable.
    pub fn load_opt<T: DeserializeOwned>(&self, key: StoreKey) -> Option<T> {
        let bytes = match self.get_raw(key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key = key.as_str(), error = %e, "Store read failed");
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = key.as_str(), error = %e, "Corrupt stored value, using default");
                None
            }
        }
    }

    /// Read a value, falling back to `default` when absent or corrupt.
    pub fn load_or<T: DeserializeOwned>(&self, key: StoreKey, default: T) -> T {
        self.load_opt(key).unwrap_or(default)
    }

    pub fn load<T: DeserializeOwned + Default>(&self, key: StoreKey) -> T {
        self.load_opt(key).unwrap_or_default()
    }

    pub fn save<T: Serialize + ?Sized>(&self, key: StoreKey, value: &T) -> StorageResult<()> {
        let bytes = serde_json::to_vec(value)?;
        self.put_raw(key, &bytes)
    }

    // ========== Flags ==========

    pub fn flag(&self, key: StoreKey) -> bool {
        self.load_opt::<bool>(key).unwrap_or(false)
    }

    /// Set flags are stored, cleared flags are removed
    pub fn set_flag(&self, key: StoreKey, on: bool) -> StorageResult<()> {
        if on {
            self.save(key, &true)
        } else {
            self.remove(key)
        }
    }
}
