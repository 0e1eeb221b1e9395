//! Handlers for `/plans/{id}/...` endpoints.

use axum::{
  Json,
  extract::{Path, State},
};
use stockstudy_core::{
  curriculum::Assignment,
  store::StudyStore,
  submission::Submission,
};
use uuid::Uuid;

use crate::{Service, caller::CurrentUser, error::ApiError};

/// `GET /plans/{id}/assignments` — ordered by question order.
pub async fn assignments<S>(
  State(service): State<Service<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Assignment>>, ApiError>
where
  S: StudyStore + 'static,
{
  Ok(Json(service.get_assignments(id).await?))
}

/// `GET /plans/{id}/submissions` — most recently submitted first.
pub async fn submissions<S>(
  State(service): State<Service<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Submission>>, ApiError>
where
  S: StudyStore + 'static,
{
  Ok(Json(service.get_day_submissions(id).await?))
}

/// `GET /plans/{id}/submissions/me`
pub async fn my_submission<S>(
  State(service): State<Service<S>>,
  CurrentUser(user_id): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Submission>, ApiError>
where
  S: StudyStore + 'static,
{
  let submission = service
    .get_submission(id, user_id)
    .await?
    .ok_or_else(|| ApiError::NotFound("submission not found".into()))?;
  Ok(Json(submission))
}
