use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Error type for pgcsv operations
#[derive(Debug, Error)]
pub enum PgCsvError {
    #[error("Error loading settings file: {0}")]
    Settings(#[from] dotenvy::Error),

    #[error("Failed to read query file {}: {source}", path.display())]
    QueryFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("TLS setup failed: {0}")]
    Tls(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Reading result row failed: {0}")]
    RowFailed(String),

    #[error("Cannot decode value of column {column}: {message}")]
    Decode { column: String, message: String },

    #[error("Failed to create output file {}: {source}", path.display())]
    OutputFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("Row {row} has {actual} value(s), header has {expected} column(s)")]
    ColumnCountMismatch {
        row: u64,
        expected: usize,
        actual: usize,
    },
}

/// Result type alias for pgcsv operations
pub type Result<T> = std::result::Result<T, PgCsvError>;
