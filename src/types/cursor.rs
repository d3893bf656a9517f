use std::fmt;

use futures::stream::{self, BoxStream, StreamExt};

use crate::error::Result;
use crate::types::SqlValue;

/// Stream of decoded rows, in the order the database produces them.
pub type RowStream = BoxStream<'static, Result<Vec<SqlValue>>>;

/// Forward-only handle over a query result.
///
/// Column names are known up front, rows are pulled one at a time.
pub struct QueryCursor {
    columns: Vec<String>,
    rows: RowStream,
}

impl QueryCursor {
    pub fn new(columns: Vec<String>, rows: RowStream) -> Self {
        Self { columns, rows }
    }

    /// Creates a cursor over rows that are already in memory.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Result<Vec<SqlValue>>>) -> Self {
        Self::new(columns, stream::iter(rows).boxed())
    }

    /// Returns the column names, in result order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Pulls the next row. `None` once the result is exhausted.
    pub async fn next_row(&mut self) -> Option<Result<Vec<SqlValue>>> {
        self.rows.next().await
    }
}

impl fmt::Debug for QueryCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCursor")
            .field("columns", &self.columns)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PgCsvError;

    #[tokio::test]
    async fn test_rows_are_yielded_in_order() {
        let mut cursor = QueryCursor::from_rows(
            vec!["id".to_string()],
            vec![
                Ok(vec![SqlValue::from(1)]),
                Ok(vec![SqlValue::from(2)]),
                Ok(vec![SqlValue::from(3)]),
            ],
        );

        assert_eq!(cursor.columns(), &["id".to_string()]);
        let mut seen = Vec::new();
        while let Some(row) = cursor.next_row().await {
            seen.push(row.unwrap());
        }
        assert_eq!(
            seen,
            vec![
                vec![SqlValue::Int(1)],
                vec![SqlValue::Int(2)],
                vec![SqlValue::Int(3)]
            ]
        );
    }

    #[tokio::test]
    async fn test_errors_pass_through() {
        let mut cursor = QueryCursor::from_rows(
            vec!["id".to_string()],
            vec![Err(PgCsvError::RowFailed("connection reset".into()))],
        );

        let err = cursor.next_row().await.unwrap().unwrap_err();
        assert!(matches!(err, PgCsvError::RowFailed(_)));
        assert!(cursor.next_row().await.is_none());
    }
}
