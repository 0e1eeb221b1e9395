//! Handlers for comment endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/submissions/{id}/comments` | visible comments, oldest first |
//! | `POST`   | `/submissions/{id}/comments` | body: `{"study_id", "content"}` |
//! | `PATCH`  | `/comments/{id}` | body: `{"content"}` |
//! | `DELETE` | `/comments/{id}` | soft delete |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use stockstudy_core::{comment::CommentWithAuthor, store::StudyStore};
use uuid::Uuid;

use crate::{Service, caller::CurrentUser, error::ApiError};

/// `GET /submissions/{id}/comments`
pub async fn list<S>(
  State(service): State<Service<S>>,
  Path(submission_id): Path<Uuid>,
) -> Result<Json<Vec<CommentWithAuthor>>, ApiError>
where
  S: StudyStore + 'static,
{
  Ok(Json(service.get_comments(submission_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub study_id: Uuid,
  pub content:  String,
}

/// `POST /submissions/{id}/comments`
pub async fn create<S>(
  State(service): State<Service<S>>,
  CurrentUser(user_id): CurrentUser,
  Path(submission_id): Path<Uuid>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: StudyStore + 'static,
{
  let comment = service
    .create_comment(submission_id, body.study_id, user_id, &body.content)
    .await?;
  Ok((StatusCode::CREATED, Json(comment)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  pub content: String,
}

/// `PATCH /comments/{id}`
pub async fn update<S>(
  State(service): State<Service<S>>,
  CurrentUser(user_id): CurrentUser,
  Path(comment_id): Path<Uuid>,
  Json(body): Json<UpdateBody>,
) -> Result<StatusCode, ApiError>
where
  S: StudyStore + 'static,
{
  service
    .update_comment(comment_id, user_id, &body.content)
    .await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /comments/{id}`
pub async fn delete_one<S>(
  State(service): State<Service<S>>,
  CurrentUser(user_id): CurrentUser,
  Path(comment_id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: StudyStore + 'static,
{
  service.delete_comment(comment_id, user_id).await?;
  Ok(StatusCode::NO_CONTENT)
}
