//! Server-level errors and their HTTP responses.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use stockstudy_api::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Missing or rejected credentials; answered with a Basic challenge.
  #[error("unauthorized")]
  Unauthorized { realm: String },

  #[error(transparent)]
  Api(#[from] ApiError),
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::Unauthorized { realm } => {
        let mut res = (
          StatusCode::UNAUTHORIZED,
          Json(json!({ "error": "authentication required" })),
        )
          .into_response();
        let challenge = format!("Basic realm=\"{realm}\", charset=\"UTF-8\"");
        let value = HeaderValue::from_str(&challenge)
          .unwrap_or_else(|_| HeaderValue::from_static("Basic"));
        res.headers_mut().insert(header::WWW_AUTHENTICATE, value);
        res
      }
      Error::Api(e) => e.into_response(),
    }
  }
}
