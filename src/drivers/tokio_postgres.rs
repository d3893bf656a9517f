use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::WebPkiServerVerifier;
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, SignatureScheme};
use tokio_postgres::types::{FromSql, Kind, ToSql, Type};
use tokio_postgres::{Client, Column, Row, SimpleQueryMessage, SimpleQueryRow};
use tokio_postgres_rustls::MakeRustlsConnect;
use tracing::{debug, error};
use uuid::Uuid;

use crate::config::TlsMode;
use crate::error::{PgCsvError, Result};
use crate::traits::DatabaseDriver;
use crate::types::{PgNumeric, QueryCursor, SqlValue};

/// Server message for query text holding more than one statement.
const MULTI_STATEMENT_MESSAGE: &str = "cannot insert multiple commands into a prepared statement";

type MessageStream =
    BoxStream<'static, std::result::Result<SimpleQueryMessage, tokio_postgres::Error>>;

/// PostgreSQL driver implementation using tokio-postgres.
pub struct TokioPostgresDriver {
    client: Client,
}

impl TokioPostgresDriver {
    /// Connect to a PostgreSQL database.
    ///
    /// Whether TLS is used is decided by the `sslmode` of the connection
    /// string. `tls_mode` decides whether the server certificate is checked.
    pub async fn connect(connection_string: &str, tls_mode: &TlsMode) -> Result<Self> {
        let tls = tls_connector(tls_mode)?;
        let (client, connection) = tokio_postgres::connect(connection_string, tls)
            .await
            .map_err(|e| PgCsvError::ConnectionFailed(e.to_string()))?;

        // Spawn the connection handler
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "PostgreSQL connection error");
            }
        });

        Ok(Self { client })
    }

    /// Run query text with several statements through the simple protocol.
    ///
    /// Cells arrive in text format and are exported as text. Only the first
    /// result set is returned; errors from later statements still fail the
    /// cursor.
    async fn simple_query(&self, sql: &str) -> Result<QueryCursor> {
        let mut messages: MessageStream = self
            .client
            .simple_query_raw(sql)
            .await
            .map_err(|e| PgCsvError::QueryFailed(e.to_string()))?
            .boxed();

        let mut columns = Vec::new();
        while let Some(message) = messages.next().await {
            let message = message.map_err(|e| PgCsvError::QueryFailed(e.to_string()))?;
            if let SimpleQueryMessage::RowDescription(description) = message {
                columns = description.iter().map(|c| c.name().to_string()).collect();
                break;
            }
        }
        debug!(columns = columns.len(), "multi-statement query started");

        let rows = stream::unfold(Some(messages), |state| async move {
            let mut messages = state?;
            match messages.next().await {
                Some(Ok(SimpleQueryMessage::Row(row))) => {
                    Some((Ok(text_row(&row)), Some(messages)))
                }
                Some(Err(e)) => Some((Err(PgCsvError::RowFailed(e.to_string())), None)),
                Some(Ok(_)) => drain(messages).await,
                None => None,
            }
        })
        .boxed();

        Ok(QueryCursor::new(columns, rows))
    }
}

/// Consume the rest of a simple-query response, surfacing the first error.
async fn drain(
    mut messages: MessageStream,
) -> Option<(Result<Vec<SqlValue>>, Option<MessageStream>)> {
    while let Some(message) = messages.next().await {
        if let Err(e) = message {
            return Some((Err(PgCsvError::RowFailed(e.to_string())), None));
        }
    }
    None
}

fn text_row(row: &SimpleQueryRow) -> Vec<SqlValue> {
    (0..row.len())
        .map(|index| match row.get(index) {
            Some(text) => SqlValue::Text(text.to_string()),
            None => SqlValue::Null,
        })
        .collect()
}

fn is_multi_statement_error(err: &tokio_postgres::Error) -> bool {
    err.as_db_error()
        .map(|db| db.message().contains(MULTI_STATEMENT_MESSAGE))
        .unwrap_or(false)
}

#[async_trait]
impl DatabaseDriver for TokioPostgresDriver {
    async fn query(&self, sql: &str) -> Result<QueryCursor> {
        let statement = match self.client.prepare(sql).await {
            Ok(statement) => statement,
            Err(e) if is_multi_statement_error(&e) => return self.simple_query(sql).await,
            Err(e) => return Err(PgCsvError::QueryFailed(e.to_string())),
        };

        let columns: Vec<String> = statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        debug!(columns = columns.len(), "statement prepared");

        let params: [&(dyn ToSql + Sync); 0] = [];
        let rows = self
            .client
            .query_raw(&statement, params)
            .await
            .map_err(|e| PgCsvError::QueryFailed(e.to_string()))?;

        let rows = rows
            .map(|row| {
                row.map_err(|e| PgCsvError::RowFailed(e.to_string()))
                    .and_then(|row| decode_row(&row))
            })
            .boxed();

        Ok(QueryCursor::new(columns, rows))
    }
}

fn tls_connector(tls_mode: &TlsMode) -> Result<MakeRustlsConnect> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let verifier = server_cert_verifier(tls_mode, Arc::clone(&provider))?;
    let config = rustls::ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| PgCsvError::Tls(e.to_string()))?
        .dangerous()
        .with_custom_certificate_verifier(verifier)
        .with_no_client_auth();

    Ok(MakeRustlsConnect::new(config))
}

/// Pick the certificate check for a TLS mode.
///
/// `verify-ca` and `verify-full` check the chain against the webpki roots and
/// the host name. Every other mode encrypts without checking, as libpq does.
fn server_cert_verifier(
    tls_mode: &TlsMode,
    provider: Arc<CryptoProvider>,
) -> Result<Arc<dyn ServerCertVerifier>> {
    if !tls_mode.verifies_certificate() {
        return Ok(Arc::new(AcceptAnyServerCert { provider }));
    }
    let roots = rustls::RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };
    let verifier = WebPkiServerVerifier::builder_with_provider(Arc::new(roots), provider)
        .build()
        .map_err(|e| PgCsvError::Tls(e.to_string()))?;
    Ok(verifier)
}

/// Accepts any server certificate but still checks handshake signatures.
#[derive(Debug)]
struct AcceptAnyServerCert {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

/// Decode every cell of a row by its column type.
fn decode_row(row: &Row) -> Result<Vec<SqlValue>> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(index, column)| decode_value(row, index, column))
        .collect()
}

fn decode_value(row: &Row, index: usize, column: &Column) -> Result<SqlValue> {
    let value = match *column.type_() {
        Type::BOOL => get::<bool>(row, index, column)?.map(SqlValue::Bool),
        Type::INT2 => get::<i16>(row, index, column)?.map(|v| SqlValue::Int(v.into())),
        Type::INT4 => get::<i32>(row, index, column)?.map(|v| SqlValue::Int(v.into())),
        Type::INT8 => get::<i64>(row, index, column)?.map(SqlValue::Int),
        Type::OID => get::<u32>(row, index, column)?.map(|v| SqlValue::Int(v.into())),
        Type::FLOAT4 => get::<f32>(row, index, column)?.map(SqlValue::Real),
        Type::FLOAT8 => get::<f64>(row, index, column)?.map(SqlValue::Double),
        Type::NUMERIC => get::<PgNumeric>(row, index, column)?.map(|n| SqlValue::Numeric(n.0)),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
            get::<String>(row, index, column)?.map(SqlValue::Text)
        }
        Type::CHAR => {
            get::<i8>(row, index, column)?.map(|v| SqlValue::Text(char::from(v as u8).to_string()))
        }
        Type::DATE => get::<NaiveDate>(row, index, column)?.map(SqlValue::Date),
        Type::TIME => get::<NaiveTime>(row, index, column)?.map(SqlValue::Time),
        Type::TIMESTAMP => get::<NaiveDateTime>(row, index, column)?.map(SqlValue::Timestamp),
        Type::TIMESTAMPTZ => get::<DateTime<Utc>>(row, index, column)?.map(SqlValue::TimestampTz),
        Type::UUID => get::<Uuid>(row, index, column)?.map(SqlValue::Uuid),
        Type::JSON | Type::JSONB => get::<serde_json::Value>(row, index, column)?.map(SqlValue::Json),
        Type::BYTEA => get::<Vec<u8>>(row, index, column)?.map(SqlValue::Binary),
        _ => match get::<RawValue>(row, index, column)? {
            Some(raw) => Some(other_value(column.name(), column.type_(), raw.0)?),
            None => None,
        },
    };

    Ok(value.unwrap_or(SqlValue::Null))
}

/// Whether the binary format of a type is its text form.
///
/// True for enums, `citext`, `xml` and domains over such types.
fn is_textual(ty: &Type) -> bool {
    match ty.kind() {
        Kind::Enum(_) => true,
        Kind::Domain(inner) => {
            matches!(
                *inner,
                Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME
            ) || is_textual(inner)
        }
        _ => *ty == Type::XML || ty.name() == "citext",
    }
}

/// Value for a column type without a dedicated tag.
fn other_value(column: &str, ty: &Type, raw: Vec<u8>) -> Result<SqlValue> {
    if !is_textual(ty) {
        return Ok(SqlValue::Other {
            type_name: ty.name().to_string(),
            raw,
        });
    }
    String::from_utf8(raw)
        .map(SqlValue::Text)
        .map_err(|e| PgCsvError::Decode {
            column: column.to_string(),
            message: e.to_string(),
        })
}

fn get<'a, T: FromSql<'a>>(row: &'a Row, index: usize, column: &Column) -> Result<Option<T>> {
    row.try_get::<_, Option<T>>(index)
        .map_err(|e| PgCsvError::Decode {
            column: column.name().to_string(),
            message: e.to_string(),
        })
}

/// Undecoded wire bytes of any type.
struct RawValue(Vec<u8>);

impl<'a> FromSql<'a> for RawValue {
    fn from_sql(
        _ty: &Type,
        raw: &'a [u8],
    ) -> std::result::Result<Self, Box<dyn std::error::Error + Sync + Send>> {
        Ok(RawValue(raw.to_vec()))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}
