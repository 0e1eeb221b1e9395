//! Error type for `stockstudy-store-sqlite`.

use rusqlite::ffi;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(tokio_rusqlite::Error),

  /// A UNIQUE or PRIMARY KEY constraint rejected the write.
  #[error("unique constraint violated: {0}")]
  Conflict(String),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("decode error: {0}")]
  Decode(String),
}

impl From<tokio_rusqlite::Error> for Error {
  fn from(e: tokio_rusqlite::Error) -> Self {
    if let tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(
      code,
      message,
    )) = &e
      && matches!(
        code.extended_code,
        ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY
      )
    {
      return Error::Conflict(
        message.clone().unwrap_or_else(|| code.to_string()),
      );
    }
    Error::Database(e)
  }
}

impl From<Error> for stockstudy_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Conflict(msg) => stockstudy_core::Error::Conflict(msg),
      other => stockstudy_core::Error::Store(Box::new(other)),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
