//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use stockstudy_core::ErrorKind;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  Conflict(String),

  #[error("{0}")]
  Forbidden(String),

  #[error("{0}")]
  BadRequest(String),

  #[error("authentication required")]
  Unauthorized,

  #[error("internal error: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::Conflict(_) => StatusCode::CONFLICT,
      ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl From<stockstudy_core::Error> for ApiError {
  fn from(e: stockstudy_core::Error) -> Self {
    match e.kind() {
      ErrorKind::NotFound => ApiError::NotFound(e.to_string()),
      ErrorKind::Conflict | ErrorKind::CapacityExceeded => {
        ApiError::Conflict(e.to_string())
      }
      ErrorKind::Forbidden => ApiError::Forbidden(e.to_string()),
      ErrorKind::Validation => ApiError::BadRequest(e.to_string()),
      ErrorKind::Unauthorized => ApiError::Unauthorized,
      ErrorKind::Internal => ApiError::Internal(Box::new(e)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let message = match &self {
      ApiError::Internal(e) => {
        tracing::error!(error = %e, "request failed");
        "internal server error".to_owned()
      }
      other => other.to_string(),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

#[cfg(test)]
mod tests {
  use stockstudy_core::Error;

  use super::*;

  #[test]
  fn core_errors_map_to_statuses() {
    let cases = [
      (Error::NotFound("study".into()), StatusCode::NOT_FOUND),
      (Error::NotMember, StatusCode::NOT_FOUND),
      (Error::Conflict("taken".into()), StatusCode::CONFLICT),
      (Error::AlreadyMember, StatusCode::CONFLICT),
      (Error::StudyFull, StatusCode::CONFLICT),
      (Error::OwnerCannotLeave, StatusCode::FORBIDDEN),
      (Error::Forbidden("no".into()), StatusCode::FORBIDDEN),
      (Error::Validation("bad".into()), StatusCode::BAD_REQUEST),
      (Error::Unauthorized, StatusCode::UNAUTHORIZED),
      (Error::PasswordHash("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (err, status) in cases {
      assert_eq!(ApiError::from(err).status(), status);
    }
  }

  #[test]
  fn internal_errors_are_not_echoed() {
    let resp = ApiError::from(Error::PasswordHash("secret detail".into()))
      .into_response();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
  }
}
