//! Error types for `stockstudy-core`.
//!
//! Every service operation fails with one of these variants. Storage backends
//! convert their own error types into [`Error`] (unique-constraint violations
//! become [`Error::Conflict`], anything else [`Error::Store`]).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{0} not found")]
  NotFound(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("you are already a member of this study")]
  AlreadyMember,

  #[error("this study has reached its maximum capacity")]
  StudyFull,

  #[error("you are not a member of this study")]
  NotMember,

  #[error("the owner cannot leave the study; delete it instead")]
  OwnerCannotLeave,

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("invalid input: {0}")]
  Validation(String),

  #[error("invalid credentials")]
  Unauthorized,

  #[error("password hashing error: {0}")]
  PasswordHash(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Coarse classification of an [`Error`], used by transport layers to choose
/// a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  NotFound,
  Conflict,
  CapacityExceeded,
  Forbidden,
  Validation,
  Unauthorized,
  Internal,
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::NotFound(_) | Self::NotMember => ErrorKind::NotFound,
      Self::Conflict(_) | Self::AlreadyMember => ErrorKind::Conflict,
      Self::StudyFull => ErrorKind::CapacityExceeded,
      Self::OwnerCannotLeave | Self::Forbidden(_) => ErrorKind::Forbidden,
      Self::Validation(_) => ErrorKind::Validation,
      Self::Unauthorized => ErrorKind::Unauthorized,
      Self::PasswordHash(_) | Self::Store(_) => ErrorKind::Internal,
    }
  }

  pub(crate) fn not_found(what: impl Into<String>) -> Self {
    Self::NotFound(what.into())
  }

  pub(crate) fn invalid(msg: impl Into<String>) -> Self {
    Self::Validation(msg.into())
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
