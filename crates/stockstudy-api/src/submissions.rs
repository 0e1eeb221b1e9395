//! Handler for `POST /submissions`.

use axum::{Json, extract::State};
use serde::Deserialize;
use stockstudy_core::{
  store::StudyStore,
  submission::{NewSubmission, RecordedSubmission, SubmissionAnswer},
};
use uuid::Uuid;

use crate::{Service, caller::CurrentUser, error::ApiError};

/// Request body; the submitting user is always the caller.
#[derive(Debug, Deserialize)]
pub struct SubmitBody {
  pub plan_id:    Uuid,
  pub study_id:   Uuid,
  pub day_number: u8,
  pub answers:    Vec<SubmissionAnswer>,
  #[serde(default)]
  pub reflection: Option<String>,
}

/// `POST /submissions` — creates or overwrites the caller's submission for
/// the plan and returns it with the refreshed progress rate.
pub async fn create<S>(
  State(service): State<Service<S>>,
  CurrentUser(user_id): CurrentUser,
  Json(body): Json<SubmitBody>,
) -> Result<Json<RecordedSubmission>, ApiError>
where
  S: StudyStore + 'static,
{
  let recorded = service
    .create_submission(NewSubmission {
      plan_id: body.plan_id,
      study_id: body.study_id,
      user_id,
      day_number: body.day_number,
      answers: body.answers,
      reflection: body.reflection,
    })
    .await?;
  Ok(Json(recorded))
}
