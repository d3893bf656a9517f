//! CSV output for query results.

use std::io::Write;

use tracing::debug;

use crate::error::{PgCsvError, Result};
use crate::types::{QueryCursor, SqlValue};

/// Writes a header record and one CSV record per result row.
///
/// Quoting follows RFC 4180: fields containing a comma, a double quote or a
/// line break are quoted and embedded quotes are doubled. Output is buffered
/// and flushed by [`CsvExporter::finish`], or on drop.
pub struct CsvExporter<W: Write> {
    writer: csv::Writer<W>,
    width: Option<usize>,
    rows_written: u64,
}

impl<W: Write> CsvExporter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(inner),
            width: None,
            rows_written: 0,
        }
    }

    /// Write the column names as the first record.
    pub fn write_header(&mut self, columns: &[String]) -> Result<()> {
        self.writer.write_record(columns)?;
        self.width = Some(columns.len());
        Ok(())
    }

    /// Render and write one row.
    ///
    /// A row with a different number of values than the header is rejected
    /// and nothing is written for it.
    pub fn write_row(&mut self, row: &[SqlValue]) -> Result<()> {
        if let Some(expected) = self.width {
            if row.len() != expected {
                return Err(PgCsvError::ColumnCountMismatch {
                    row: self.rows_written + 1,
                    expected,
                    actual: row.len(),
                });
            }
        }
        self.writer.write_record(row.iter().map(SqlValue::render))?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Flush buffered output and return the number of data records written.
    pub fn finish(mut self) -> Result<u64> {
        self.writer.flush().map_err(csv::Error::from)?;
        Ok(self.rows_written)
    }
}

/// Drain a cursor into an exporter: header first, then every row in order.
pub async fn export_cursor<W: Write>(
    mut cursor: QueryCursor,
    mut exporter: CsvExporter<W>,
) -> Result<u64> {
    exporter.write_header(cursor.columns())?;
    while let Some(row) = cursor.next_row().await {
        exporter.write_row(&row?)?;
        if exporter.rows_written() % 10_000 == 0 {
            debug!(rows = exporter.rows_written(), "export progress");
        }
    }
    exporter.finish()
}
