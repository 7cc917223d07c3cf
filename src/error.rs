use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A document is not valid JSON or misses/mistypes a required field.
    #[error("Malformed document {path:?}: {source}")]
    MalformedDocument {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The resolver inserted a row and could not find it again.
    #[error("Integrity error: no {table} row matches {key} after insert")]
    Integrity { table: &'static str, key: String },

    /// SQLite errors, propagated unchanged.
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("I/O error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory scan failed: {0}")]
    Scan(#[from] walkdir::Error),

    #[error("Document scanner thread panicked")]
    ScannerPanicked,
}

pub type Result<T> = std::result::Result<T, Error>;
