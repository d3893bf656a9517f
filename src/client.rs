use std::sync::Arc;

use tracing::info;

use crate::config::ConnectionParams;
use crate::drivers::TokioPostgresDriver;
use crate::error::{PgCsvError, Result};
use crate::traits::DatabaseDriver;
use crate::types::QueryCursor;

/// Main entry point for pgcsv.
/// Holds a database connection and runs queries against it.
pub struct PgCsvClient {
    driver: Arc<dyn DatabaseDriver>,
}

impl PgCsvClient {
    /// Connect to a PostgreSQL database using the given parameters.
    ///
    /// # Example
    /// ```ignore
    /// let params = ConnectionParams::from_env();
    /// let client = PgCsvClient::connect(&params).await?;
    /// ```
    pub async fn connect(params: &ConnectionParams) -> Result<Self> {
        info!(
            host = %params.host,
            port = %params.port,
            dbname = %params.dbname,
            user = %params.user,
            sslmode = %params.ssl_mode,
            "connecting to PostgreSQL"
        );
        let driver =
            TokioPostgresDriver::connect(&params.connection_string(), &params.tls_mode()).await?;
        Ok(Self {
            driver: Arc::new(driver),
        })
    }

    /// Create a new client with a custom driver.
    /// Useful for testing or using alternative database drivers.
    pub fn with_driver(driver: Arc<dyn DatabaseDriver>) -> Self {
        Self { driver }
    }

    /// Execute a query and return a cursor over its rows.
    ///
    /// Query text that is empty or only whitespace is rejected without
    /// reaching the driver.
    pub async fn query(&self, sql: &str) -> Result<QueryCursor> {
        if sql.trim().is_empty() {
            return Err(PgCsvError::QueryFailed("query text is empty".to_string()));
        }
        self.driver.query(sql).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::{InMemoryTestDriver, InMemoryTestResponseBuilder};

    #[tokio::test]
    async fn test_query_passes_text_through_unchanged() {
        let driver = Arc::new(InMemoryTestDriver::new().with_response(
            InMemoryTestResponseBuilder::new().columns(&["one"]).build(),
        ));
        let client = PgCsvClient::with_driver(Arc::clone(&driver) as Arc<dyn DatabaseDriver>);

        let cursor = client.query("SELECT 1 AS one ").await.unwrap();
        assert_eq!(cursor.columns(), &["one".to_string()]);
        driver.assert_last_query("SELECT 1 AS one ");
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected() {
        let driver = Arc::new(InMemoryTestDriver::new());
        let client = PgCsvClient::with_driver(Arc::clone(&driver) as Arc<dyn DatabaseDriver>);

        for sql in ["", "   ", " \n "] {
            let err = client.query(sql).await.unwrap_err();
            assert!(matches!(err, PgCsvError::QueryFailed(_)));
        }
        driver.assert_query_count(0);
    }

    #[tokio::test]
    async fn test_connect_with_invalid_params_fails() {
        let params = ConnectionParams {
            host: "localhost".into(),
            port: "not-a-port".into(),
            ..Default::default()
        };
        let err = PgCsvClient::connect(&params).await.err().unwrap();
        assert!(matches!(err, PgCsvError::ConnectionFailed(_)));
    }
}
