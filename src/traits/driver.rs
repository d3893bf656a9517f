use async_trait::async_trait;

use crate::error::Result;
use crate::types::QueryCursor;

/// Trait for database driver implementations.
/// Drivers are responsible for:
/// - Connecting to the database
/// - Executing the query text as-is
/// - Decoding result cells into `SqlValue`s and exposing them as a `QueryCursor`
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Execute a SQL query and return a cursor over its rows.
    /// The column names must be available even when the result has no rows.
    async fn query(&self, sql: &str) -> Result<QueryCursor>;
}
