//! Handlers for account endpoints: `/users`, `/login`, `/me`.

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use stockstudy_core::{
  store::StudyStore,
  user::{Registration, User},
};

use crate::{Service, caller::CurrentUser, error::ApiError};

/// `POST /users` — body: `{"username", "email", "password", "photo_url"?}`
pub async fn register<S>(
  State(service): State<Service<S>>,
  Json(body): Json<Registration>,
) -> Result<impl IntoResponse, ApiError>
where
  S: StudyStore + 'static,
{
  let user = service.register_user(body).await?;
  Ok((StatusCode::CREATED, Json(user)))
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  /// Username or email.
  pub login:    String,
  pub password: String,
}

/// `POST /login`
pub async fn login<S>(
  State(service): State<Service<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<User>, ApiError>
where
  S: StudyStore + 'static,
{
  let user = service.authenticate(&body.login, &body.password).await?;
  Ok(Json(user))
}

/// `GET /me`
pub async fn me<S>(
  State(service): State<Service<S>>,
  CurrentUser(user_id): CurrentUser,
) -> Result<Json<User>, ApiError>
where
  S: StudyStore + 'static,
{
  let user = service
    .get_user(user_id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("user {user_id} not found")))?;
  Ok(Json(user))
}
