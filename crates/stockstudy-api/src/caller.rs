//! The authenticated caller, as placed in request extensions by whatever
//! authentication layer wraps the router.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::ApiError;

/// Id of the user making the request.
///
/// Extraction fails with [`ApiError::Unauthorized`] when no auth layer has
/// inserted one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub Uuid);

impl<St> FromRequestParts<St> for CurrentUser
where
  St: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &St,
  ) -> Result<Self, Self::Rejection> {
    parts
      .extensions
      .get::<CurrentUser>()
      .copied()
      .ok_or(ApiError::Unauthorized)
  }
}
