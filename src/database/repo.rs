use indicatif::ProgressBar;
use rusqlite::{Connection, TransactionBehavior};
use std::path::Path;
use tracing::info;

use crate::database::schema::create_schema;
use crate::error::Result;
use crate::ingest::loader::load_all;
use crate::ingest::scanner::SourceDocument;

/// Owns the storage connection for a whole run.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// Ephemeral storage, gone when the store is dropped.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    pub fn create_schema(&self, reset_existing: bool) -> Result<()> {
        create_schema(&self.conn, reset_existing)
    }

    /// Ingest a batch of documents and commit once at the end.
    ///
    /// The batch runs inside a single IMMEDIATE transaction, so the write lock
    /// is held from the first resolution to the commit. If any document fails
    /// the transaction is dropped uncommitted and the database is left as it
    /// was before the batch.
    pub fn load<I>(&mut self, documents: I, progress: &ProgressBar) -> Result<usize>
    where
        I: IntoIterator<Item = Result<SourceDocument>>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let count = load_all(&tx, documents, progress)?;

        tx.commit()?;
        info!("Committed {} documents", count);
        Ok(count)
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}
