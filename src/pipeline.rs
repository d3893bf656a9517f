//! The export run: query file → connection → cursor → CSV file.

use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::client::PgCsvClient;
use crate::config::ConnectionParams;
use crate::error::{PgCsvError, Result};
use crate::exporter::{export_cursor, CsvExporter};
use crate::query_file::{load_query, LineJoin};

/// Paths and switches for a single export.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub query_path: PathBuf,
    pub output_path: PathBuf,
    pub line_join: LineJoin,
}

/// Outcome of a successful export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub output: PathBuf,
    pub rows_written: u64,
}

/// Run a complete export against PostgreSQL.
///
/// The query file is read before connecting, so a missing query file never
/// touches the database or the output path.
pub async fn run(params: &ConnectionParams, options: &ExportOptions) -> Result<ExportSummary> {
    let query = load_query(&options.query_path, options.line_join)?;
    let client = PgCsvClient::connect(params).await?;
    export_query(&client, &query, &options.output_path).await
}

/// Execute `query` and write its result to `output`.
///
/// The output file is created (or truncated) only once the query has been
/// accepted, so a rejected query leaves an existing file untouched.
pub async fn export_query(
    client: &PgCsvClient,
    query: &str,
    output: &Path,
) -> Result<ExportSummary> {
    let cursor = client.query(query).await?;
    info!(columns = cursor.columns().len(), "query accepted");

    let file = File::create(output).map_err(|source| PgCsvError::OutputFile {
        path: output.to_path_buf(),
        source,
    })?;
    let rows_written = export_cursor(cursor, CsvExporter::new(file)).await?;
    info!(rows = rows_written, output = %output.display(), "export finished");

    Ok(ExportSummary {
        output: output.to_path_buf(),
        rows_written,
    })
}
