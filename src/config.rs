//! Connection settings.
//!
//! Settings come from a `name=value` file that is loaded into the process
//! environment once at startup. After that, [`ConnectionParams`] is the only
//! holder of the values; nothing else in the crate reads the environment.

use std::fmt;
use std::path::Path;

use crate::error::Result;

pub const HOST_KEY: &str = "PG_HOSTNAME";
pub const DBNAME_KEY: &str = "PG_DBNAME";
pub const PASSWORD_KEY: &str = "PG_PASSWORD";
pub const USER_KEY: &str = "PG_USERNAME";
pub const PORT_KEY: &str = "PG_PORT";
pub const SSL_MODE_KEY: &str = "SSL_MODE";

/// Load a settings file into the process environment.
///
/// Variables already present in the environment are left untouched.
pub fn load_settings_file(path: &Path) -> Result<()> {
    dotenvy::from_path(path)?;
    Ok(())
}

/// Parameters needed to open a PostgreSQL connection.
///
/// Missing settings are kept as empty strings; the driver decides whether the
/// resulting connection string is usable.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConnectionParams {
    pub host: String,
    pub port: String,
    pub dbname: String,
    pub user: String,
    pub password: String,
    pub ssl_mode: String,
}

impl ConnectionParams {
    /// Read the parameters from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the parameters from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).unwrap_or_default();
        Self {
            host: get(HOST_KEY),
            port: get(PORT_KEY),
            dbname: get(DBNAME_KEY),
            user: get(USER_KEY),
            password: get(PASSWORD_KEY),
            ssl_mode: get(SSL_MODE_KEY),
        }
    }

    /// The TLS mode named by the `SSL_MODE` setting.
    pub fn tls_mode(&self) -> TlsMode {
        TlsMode::parse(&self.ssl_mode)
    }

    /// Format the parameters as a key=value connection string.
    ///
    /// Values are always single-quoted so that empty values and values with
    /// spaces keep their position. `sslmode` is left out when unset so the
    /// driver default applies; the verifying modes are sent as `require`.
    ///
    /// # Example
    /// ```
    /// use pgcsv::ConnectionParams;
    ///
    /// let params = ConnectionParams {
    ///     host: "localhost".into(),
    ///     port: "5432".into(),
    ///     dbname: "app".into(),
    ///     user: "reader".into(),
    ///     password: "it's".into(),
    ///     ssl_mode: "disable".into(),
    /// };
    /// assert_eq!(
    ///     params.connection_string(),
    ///     r"user='reader' dbname='app' host='localhost' password='it\'s' port='5432' sslmode='disable'"
    /// );
    /// ```
    pub fn connection_string(&self) -> String {
        let mut out = format!(
            "user={} dbname={} host={} password={} port={}",
            quote(&self.user),
            quote(&self.dbname),
            quote(&self.host),
            quote(&self.password),
            quote(&self.port),
        );
        if let Some(mode) = self.tls_mode().driver_ssl_mode() {
            out.push_str(" sslmode=");
            out.push_str(&quote(mode));
        }
        out
    }
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}

/// Value of the `SSL_MODE` setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsMode {
    /// No `SSL_MODE` given; the driver default (`prefer`) applies.
    Unset,
    Disable,
    /// Encrypt when the server offers it, without checking its certificate.
    Prefer,
    /// Always encrypt, without checking the server certificate.
    Require,
    /// Always encrypt and check the certificate chain and host name.
    VerifyCa,
    VerifyFull,
    /// Passed through; the driver rejects it.
    Unknown(String),
}

impl TlsMode {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "" => TlsMode::Unset,
            "disable" => TlsMode::Disable,
            "prefer" => TlsMode::Prefer,
            "require" => TlsMode::Require,
            "verify-ca" => TlsMode::VerifyCa,
            "verify-full" => TlsMode::VerifyFull,
            other => TlsMode::Unknown(other.to_string()),
        }
    }

    /// The `sslmode` understood by tokio-postgres, if any should be sent.
    pub fn driver_ssl_mode(&self) -> Option<&str> {
        match self {
            TlsMode::Unset => None,
            TlsMode::Disable => Some("disable"),
            TlsMode::Prefer => Some("prefer"),
            TlsMode::Require | TlsMode::VerifyCa | TlsMode::VerifyFull => Some("require"),
            TlsMode::Unknown(mode) => Some(mode),
        }
    }

    /// Whether the server certificate is checked against the trusted roots.
    pub fn verifies_certificate(&self) -> bool {
        matches!(self, TlsMode::VerifyCa | TlsMode::VerifyFull)
    }
}

fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        if c == '\'' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_reads_all_keys() {
        let params = ConnectionParams::from_lookup(lookup_from(&[
            ("PG_HOSTNAME", "db.internal"),
            ("PG_DBNAME", "sales"),
            ("PG_PASSWORD", "secret"),
            ("PG_USERNAME", "report"),
            ("PG_PORT", "6432"),
            ("SSL_MODE", "require"),
        ]));

        assert_eq!(params.host, "db.internal");
        assert_eq!(params.dbname, "sales");
        assert_eq!(params.password, "secret");
        assert_eq!(params.user, "report");
        assert_eq!(params.port, "6432");
        assert_eq!(params.ssl_mode, "require");
    }

    #[test]
    fn test_missing_keys_become_empty_strings() {
        let params = ConnectionParams::from_lookup(lookup_from(&[("PG_HOSTNAME", "localhost")]));

        assert_eq!(params.host, "localhost");
        assert_eq!(params.port, "");
        assert_eq!(params.password, "");
        assert_eq!(
            params.connection_string(),
            "user='' dbname='' host='localhost' password='' port=''"
        );
    }

    #[test]
    fn test_missing_ssl_mode_uses_driver_default() {
        let params = ConnectionParams {
            host: "localhost".into(),
            port: "5432".into(),
            user: "reader".into(),
            ..Default::default()
        };
        assert_eq!(params.tls_mode(), TlsMode::Unset);
        assert!(!params.connection_string().contains("sslmode"));

        let config: tokio_postgres::Config = params.connection_string().parse().unwrap();
        assert_eq!(config.get_ssl_mode(), tokio_postgres::config::SslMode::Prefer);
    }

    #[test]
    fn test_tls_modes_map_to_driver_modes() {
        let cases = [
            ("disable", Some("disable"), false),
            ("prefer", Some("prefer"), false),
            ("require", Some("require"), false),
            ("verify-ca", Some("require"), true),
            ("verify-full", Some("require"), true),
            ("", None, false),
        ];
        for (setting, driver_mode, verifies) in cases {
            let mode = TlsMode::parse(setting);
            assert_eq!(mode.driver_ssl_mode(), driver_mode, "{}", setting);
            assert_eq!(mode.verifies_certificate(), verifies, "{}", setting);
        }

        let params = ConnectionParams {
            ssl_mode: "verify-full".into(),
            ..Default::default()
        };
        assert!(params.connection_string().ends_with("sslmode='require'"));
    }

    #[test]
    fn test_unknown_tls_mode_is_passed_through() {
        let mode = TlsMode::parse("allow-maybe");
        assert_eq!(mode, TlsMode::Unknown("allow-maybe".into()));
        assert_eq!(mode.driver_ssl_mode(), Some("allow-maybe"));
    }

    #[test]
    fn test_connection_string_escapes_quotes_and_backslashes() {
        let params = ConnectionParams {
            password: r"a b'c\d".to_string(),
            ..Default::default()
        };
        assert!(params
            .connection_string()
            .contains(r"password='a b\'c\\d'"));
    }

    #[test]
    fn test_connection_string_is_accepted_by_driver_parser() {
        let params = ConnectionParams {
            host: "localhost".into(),
            port: "5432".into(),
            dbname: "app".into(),
            user: "reader".into(),
            password: "p w'd".into(),
            ssl_mode: "prefer".into(),
        };
        let config: tokio_postgres::Config = params.connection_string().parse().unwrap();

        assert_eq!(config.get_user(), Some("reader"));
        assert_eq!(config.get_dbname(), Some("app"));
        assert_eq!(config.get_password(), Some(&b"p w'd"[..]));
        assert_eq!(config.get_ports(), &[5432]);
    }

    #[test]
    fn test_debug_redacts_password() {
        let params = ConnectionParams {
            password: "hunter2".into(),
            ..Default::default()
        };
        let debug = format!("{:?}", params);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_load_settings_file_missing_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_settings_file(&dir.path().join("absent.env")).unwrap_err();
        assert!(matches!(err, crate::PgCsvError::Settings(_)));
    }

    #[test]
    fn test_load_settings_file_sets_environment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.env");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "PGCSV_TEST_ONLY_KEY=from-file").unwrap();
        drop(file);

        load_settings_file(&path).unwrap();
        assert_eq!(std::env::var("PGCSV_TEST_ONLY_KEY").unwrap(), "from-file");
    }
}
