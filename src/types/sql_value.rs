use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use uuid::Uuid;

/// A single result cell in a driver-agnostic way.
/// Drivers are responsible for converting their native values to these tags.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Text(String),
    Int(i64),
    Real(f32),
    Double(f64),
    Bool(bool),
    /// Arbitrary precision number, already in canonical decimal text form.
    Numeric(String),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Uuid(Uuid),
    Json(serde_json::Value),
    Binary(Vec<u8>),
    /// A value of a binary-format type without a dedicated tag, as sent by
    /// the server. Text-like types (enums, domains over text) become `Text`.
    Other { type_name: String, raw: Vec<u8> },
}

impl SqlValue {
    /// Render the value as a CSV field.
    ///
    /// | tag           | rendering                                      |
    /// |---------------|------------------------------------------------|
    /// | `Null`        | empty string                                   |
    /// | `Text`        | verbatim                                       |
    /// | `Int`         | decimal                                        |
    /// | `Real`/`Double` | shortest round-trip decimal, `NaN`, `inf`, `-inf` |
    /// | `Bool`        | `true` / `false`                               |
    /// | `Numeric`     | verbatim                                       |
    /// | `Date`        | `YYYY-MM-DD`                                   |
    /// | `Time`        | `HH:MM:SS[.fff]`                               |
    /// | `Timestamp`   | `YYYY-MM-DD HH:MM:SS[.fff]`                    |
    /// | `TimestampTz` | `YYYY-MM-DD HH:MM:SS[.fff]+00:00` (UTC)        |
    /// | `Uuid`        | lowercase hyphenated                           |
    /// | `Json`        | compact JSON                                   |
    /// | `Binary`      | `\x` + lowercase hex                           |
    /// | `Other`       | `\x` + lowercase hex of the wire bytes          |
    ///
    /// Fractional seconds are printed with 3, 6 or 9 digits and omitted when zero.
    pub fn render(&self) -> String {
        match self {
            SqlValue::Null => String::new(),
            SqlValue::Text(s) | SqlValue::Numeric(s) => s.clone(),
            SqlValue::Int(i) => i.to_string(),
            SqlValue::Real(f) => f.to_string(),
            SqlValue::Double(f) => f.to_string(),
            SqlValue::Bool(b) => b.to_string(),
            SqlValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            SqlValue::Time(t) => t.format("%H:%M:%S%.f").to_string(),
            SqlValue::Timestamp(ts) => ts.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
            SqlValue::TimestampTz(ts) => ts.format("%Y-%m-%d %H:%M:%S%.f%:z").to_string(),
            SqlValue::Uuid(u) => u.hyphenated().to_string(),
            SqlValue::Json(v) => v.to_string(),
            SqlValue::Binary(bytes) | SqlValue::Other { raw: bytes, .. } => hex_escape(bytes),
        }
    }
}

fn hex_escape(bytes: &[u8]) -> String {
    format!("\\x{}", hex::encode(bytes))
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(value.into())
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<f32> for SqlValue {
    fn from(value: f32) -> Self {
        SqlValue::Real(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Double(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(value: NaiveDate) -> Self {
        SqlValue::Date(value)
    }
}

impl From<NaiveTime> for SqlValue {
    fn from(value: NaiveTime) -> Self {
        SqlValue::Time(value)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(value: NaiveDateTime) -> Self {
        SqlValue::Timestamp(value)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(value: DateTime<Utc>) -> Self {
        SqlValue::TimestampTz(value)
    }
}

impl From<Uuid> for SqlValue {
    fn from(value: Uuid) -> Self {
        SqlValue::Uuid(value)
    }
}

impl From<serde_json::Value> for SqlValue {
    fn from(value: serde_json::Value) -> Self {
        SqlValue::Json(value)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(value: Vec<u8>) -> Self {
        SqlValue::Binary(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => SqlValue::Null,
        }
    }
}
