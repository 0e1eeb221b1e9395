//! HTTP Basic-auth middleware backed by the user registry.
//!
//! The username part of the credentials may be either a username or an
//! email address. On success the caller's id is stored in the request
//! extensions as a [`CurrentUser`].

use axum::{
  extract::{Request, State},
  http::{HeaderMap, header},
  middleware::Next,
  response::Response,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use stockstudy_api::CurrentUser;
use stockstudy_core::{ErrorKind, store::StudyStore};

use crate::{AppState, error::Error};

/// Decode `Authorization: Basic <base64(login:password)>`.
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
  let header_val = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())?;
  let encoded = header_val.strip_prefix("Basic ")?;
  let decoded = B64.decode(encoded.trim()).ok()?;
  let creds = String::from_utf8(decoded).ok()?;
  let (login, password) = creds.split_once(':')?;
  Some((login.to_owned(), password.to_owned()))
}

/// Reject the request with 401 unless it carries valid credentials.
pub async fn require_user<S>(
  State(state): State<AppState<S>>,
  mut req: Request,
  next: Next,
) -> Result<Response, Error>
where
  S: StudyStore + 'static,
{
  let (login, password) =
    basic_credentials(req.headers()).ok_or_else(|| state.unauthorized())?;

  let user = match state.service.verify_credentials(&login, &password).await {
    Ok(user) => user,
    Err(e) if e.kind() == ErrorKind::Unauthorized => {
      tracing::debug!(%login, "rejected credentials");
      return Err(state.unauthorized());
    }
    Err(e) => return Err(Error::Api(e.into())),
  };

  req.extensions_mut().insert(CurrentUser(user.user_id));
  Ok(next.run(req).await)
}
