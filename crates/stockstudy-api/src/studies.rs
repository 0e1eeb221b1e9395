//! Handlers for `/studies` endpoints.
//!
//! Reads are open to any authenticated user; membership changes act on the
//! caller only.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use stockstudy_core::{
  curriculum::DayPlan,
  store::StudyStore,
  study::{MemberProfile, NewStudy, StudyMember, StudyProgress, StudyWithMemberCount},
  submission::Submission,
};
use uuid::Uuid;

use crate::{Service, caller::CurrentUser, error::ApiError};

// ─── Collection ───────────────────────────────────────────────────────────────

/// `GET /studies` — the caller's active studies with progress.
pub async fn list<S>(
  State(service): State<Service<S>>,
  CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<StudyProgress>>, ApiError>
where
  S: StudyStore + 'static,
{
  let today = Utc::now().date_naive();
  let rows = service
    .get_user_studies_with_progress(user_id, today)
    .await?;
  Ok(Json(rows))
}

/// `POST /studies` — the caller becomes the owner.
pub async fn create<S>(
  State(service): State<Service<S>>,
  CurrentUser(user_id): CurrentUser,
  Json(body): Json<NewStudy>,
) -> Result<impl IntoResponse, ApiError>
where
  S: StudyStore + 'static,
{
  let created = service.create_study(body, user_id).await?;
  Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Debug, Deserialize)]
pub struct JoinBody {
  pub invite_code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Joined {
  pub study_id: Uuid,
}

/// `POST /studies/join` — body: `{"invite_code":"AB12CD34"}`
pub async fn join<S>(
  State(service): State<Service<S>>,
  CurrentUser(user_id): CurrentUser,
  Json(body): Json<JoinBody>,
) -> Result<Json<Joined>, ApiError>
where
  S: StudyStore + 'static,
{
  let study_id = service.join_study(&body.invite_code, user_id).await?;
  Ok(Json(Joined { study_id }))
}

// ─── Single study ─────────────────────────────────────────────────────────────

/// `GET /studies/{id}`
pub async fn get_one<S>(
  State(service): State<Service<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<StudyWithMemberCount>, ApiError>
where
  S: StudyStore + 'static,
{
  let study = service
    .get_study_with_member_count(id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("study {id} not found")))?;
  Ok(Json(study))
}

/// `DELETE /studies/{id}` — owner only.
pub async fn delete_one<S>(
  State(service): State<Service<S>>,
  CurrentUser(user_id): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: StudyStore + 'static,
{
  service.delete_study(id, user_id).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /studies/{id}/leave`
pub async fn leave<S>(
  State(service): State<Service<S>>,
  CurrentUser(user_id): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: StudyStore + 'static,
{
  service.leave_study(id, user_id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Members ──────────────────────────────────────────────────────────────────

/// `GET /studies/{id}/members`
pub async fn members<S>(
  State(service): State<Service<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<MemberProfile>>, ApiError>
where
  S: StudyStore + 'static,
{
  Ok(Json(service.get_study_members(id).await?))
}

/// `GET /studies/{id}/members/me` — 404 if the caller never joined.
pub async fn my_membership<S>(
  State(service): State<Service<S>>,
  CurrentUser(user_id): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<StudyMember>, ApiError>
where
  S: StudyStore + 'static,
{
  let member = service
    .get_user_study_member(user_id, id)
    .await?
    .ok_or_else(|| ApiError::NotFound("membership not found".into()))?;
  Ok(Json(member))
}

// ─── Curriculum & progress ────────────────────────────────────────────────────

/// `GET /studies/{id}/plans`
pub async fn plans<S>(
  State(service): State<Service<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<DayPlan>>, ApiError>
where
  S: StudyStore + 'static,
{
  Ok(Json(service.get_day_plans(id).await?))
}

#[derive(Debug, Deserialize)]
pub struct SubmissionsParams {
  pub user_id: Option<Uuid>,
}

/// `GET /studies/{id}/submissions[?user_id=<uuid>]`
pub async fn submissions<S>(
  State(service): State<Service<S>>,
  CurrentUser(caller): CurrentUser,
  Path(id): Path<Uuid>,
  Query(params): Query<SubmissionsParams>,
) -> Result<Json<Vec<Submission>>, ApiError>
where
  S: StudyStore + 'static,
{
  let user_id = params.user_id.unwrap_or(caller);
  Ok(Json(service.get_user_submissions(id, user_id).await?))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Progress {
  pub progress_rate: u8,
}

/// `POST /studies/{id}/progress`
pub async fn refresh_progress<S>(
  State(service): State<Service<S>>,
  CurrentUser(user_id): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Progress>, ApiError>
where
  S: StudyStore + 'static,
{
  let progress_rate = service.update_progress_rate(id, user_id).await?;
  Ok(Json(Progress { progress_rate }))
}
