use std::fmt;

use transit_engine::store::StoreError;

/// A stored numeric repr that doesn't match any variant of the target enum.
/// Should never happen against a database populated through this crate's
/// own migrations; surfaced as `StoreError::Other` rather than panicking,
/// since a bad row is the store's problem, not a programmer error in the
/// engine calling it.
#[derive(Debug)]
pub struct RowDecodeError {
    column: &'static str,
    value: i16,
}

impl RowDecodeError {
    pub fn new(column: &'static str, value: i16) -> Self {
        Self { column, value }
    }
}

impl fmt::Display for RowDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized value {} in column {}", self.value, self.column)
    }
}

impl std::error::Error for RowDecodeError {}

impl From<RowDecodeError> for StoreError {
    fn from(why: RowDecodeError) -> Self {
        StoreError::Other(Box::new(why))
    }
}

/// Maps a raw `sqlx::Error` onto the engine's storage-error taxonomy, the
/// same distinction the teacher's `queries::convert_error` draws between
/// "nothing there" and "something went wrong talking to postgres".
pub fn convert_error(why: sqlx::Error) -> StoreError {
    match why {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            StoreError::Unavailable(why.to_string())
        }
        other => StoreError::Other(Box::new(other)),
    }
}
