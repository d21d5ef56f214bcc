//! Error type for `roster-store-sqlite`.

use roster_core::{ErrorKind, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] roster_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// Raised inside a transaction; unique-constraint violations never end up
  /// here, see the `From<rusqlite::Error>` impl.
  #[error("sqlite error: {0}")]
  Sqlite(rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("decimal parse error: {0}")]
  Decimal(#[from] rust_decimal::Error),

  #[error("unknown {column} value in database: {value:?}")]
  UnknownValue {
    column: &'static str,
    value:  String,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl StoreError for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Error::Core(e) => e.kind(),
      _ => ErrorKind::Internal,
    }
  }
}

impl From<rusqlite::Error> for Error {
  fn from(e: rusqlite::Error) -> Self {
    if is_unique_violation(&e) {
      // A concurrent writer got past the application-level check first.
      tracing::warn!(error = %e, "uniqueness constraint rejected a write");
      return Error::Core(roster_core::Error::conflict(
        "a conflicting record was written concurrently",
        None,
      ));
    }
    Error::Sqlite(e)
  }
}

pub(crate) fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(err, _)
      if err.code == rusqlite::ErrorCode::ConstraintViolation
        && (err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
          || err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
  )
}

/// Map a unique-constraint violation to a conflict carrying `message`; any
/// other failure goes through the generic conversion.
pub(crate) fn conflict_on_unique(message: &'static str) -> impl FnOnce(rusqlite::Error) -> Error {
  move |e| {
    if is_unique_violation(&e) {
      tracing::debug!(error = %e, "{message}");
      Error::Core(roster_core::Error::conflict(message, None))
    } else {
      Error::from(e)
    }
  }
}
