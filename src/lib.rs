//! pgcsv - Export the result of a PostgreSQL query to a CSV file
//!
//! # Example
//! ```ignore
//! use pgcsv::{ConnectionParams, PgCsvClient};
//! use pgcsv::pipeline::export_query;
//!
//! // Connect to database
//! let params = ConnectionParams::from_env();
//! let client = PgCsvClient::connect(&params).await?;
//!
//! // Stream the result into a CSV file
//! let summary = export_query(&client, "SELECT id, name FROM users", "users.csv".as_ref()).await?;
//! println!("{} rows", summary.rows_written);
//! ```

pub mod cli;
pub mod config;
pub mod drivers;
pub mod error;
pub mod exporter;
pub mod pipeline;
pub mod query_file;
pub mod traits;
pub mod types;

mod client;

// Re-export main types for convenient access
pub use client::PgCsvClient;
pub use config::ConnectionParams;
pub use error::{PgCsvError, Result};
pub use exporter::CsvExporter;
pub use pipeline::{ExportOptions, ExportSummary};
pub use query_file::LineJoin;
pub use traits::DatabaseDriver;
pub use types::{QueryCursor, SqlValue};
