//! redb-backed persistence of the canonical document
//!
//! One table, one row: the whole document as JSON. Reads go through the
//! versioned-schema reader so files written by older deployments still load.

use redb::{Database, ReadableDatabase, TableDefinition};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use shared::document::SharedDocument;
use shared::schema::read_document;
use shared::util::now_millis;

/// app_data table: key = "document", value = JSON
const APP_DATA_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("app_data");

const DOCUMENT_KEY: &str = "document";

#[derive(Debug, Error)]
pub enum StoreError {
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

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Clone)]
pub struct DocumentStore {
    db: Arc<Database>,
}

impl DocumentStore {
    /// Open or create database
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::init(Database::create(path)?)
    }

    /// Open in-memory database (tests)
    pub fn open_in_memory() -> StoreResult<Self> {
        let db =
            Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StoreResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(APP_DATA_TABLE)?;
        }
        write_txn.commit()?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Stored document, `None` on a fresh database
    pub fn load(&self) -> StoreResult<Option<SharedDocument>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(APP_DATA_TABLE)?;
        let Some(bytes) = table.get(DOCUMENT_KEY)? else {
            return Ok(None);
        };
        let value: serde_json::Value = serde_json::from_slice(bytes.value())?;
        Ok(Some(read_document(value, now_millis())))
    }

    pub fn save(&self, doc: &SharedDocument) -> StoreResult<()> {
        let bytes = serde_json::to_vec(doc)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(APP_DATA_TABLE)?;
            table.insert(DOCUMENT_KEY, bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }
}
