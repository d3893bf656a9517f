mod cursor;
mod numeric;
mod sql_value;

pub use self::cursor::QueryCursor;
pub use self::numeric::PgNumeric;
pub use self::sql_value::SqlValue;
