//! The `StudyStore` trait — the data-access port of the study service.
//!
//! Implemented by storage backends (e.g. `stockstudy-store-sqlite`). The
//! business rules in [`crate::service`] are written once against this trait;
//! the concrete backend is chosen by the binary.
//!
//! Methods that write more than one row (`insert_study`, `admit_member`,
//! `save_submission`, `delete_study`) must be atomic: either every row is
//! written or none is.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  comment::{Comment, CommentWithAuthor},
  curriculum::{Assignment, DayPlan, SeededDay},
  invite::InviteCode,
  study::{Admission, MemberProfile, Study, StudyMember},
  submission::{RecordedSubmission, Submission, SubmissionDraft},
  user::User,
};

/// Abstraction over a study store backend.
///
/// All methods return `Send` futures so the trait can be used behind axum
/// handlers on a multi-threaded runtime.
///
/// Backends must report unique-constraint violations as an error that
/// converts into [`crate::Error::Conflict`].
pub trait StudyStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static + Into<crate::Error>;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Persist a new user. Username and email are unique.
  fn insert_user(
    &self,
    user: User,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Look a user up by username or by email.
  fn find_user_by_login(
    &self,
    login: String,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn record_login(
    &self,
    user_id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Studies ───────────────────────────────────────────────────────────

  /// Insert a study, its owner membership and its whole curriculum in one
  /// transaction.
  fn insert_study(
    &self,
    study: Study,
    owner: StudyMember,
    curriculum: Vec<SeededDay>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_study(
    &self,
    study_id: Uuid,
  ) -> impl Future<Output = Result<Option<Study>, Self::Error>> + Send + '_;

  fn find_study_by_invite_code(
    &self,
    code: InviteCode,
  ) -> impl Future<Output = Result<Option<Study>, Self::Error>> + Send + '_;

  /// Remove a study and every row that hangs off it. Returns `false` if the
  /// study did not exist.
  fn delete_study(
    &self,
    study_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Studies in which `user_id` has an active membership, with that
  /// membership.
  fn list_user_studies(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<(Study, StudyMember)>, Self::Error>>
  + Send
  + '_;

  // ── Memberships ───────────────────────────────────────────────────────

  /// Insert `member` unless a row for the same (study, user) already exists
  /// or the study already has `max_members` active members. Check and insert
  /// happen in one transaction.
  fn admit_member(
    &self,
    member: StudyMember,
    max_members: u32,
  ) -> impl Future<Output = Result<Admission, Self::Error>> + Send + '_;

  /// The (study, user) membership row, active or not.
  fn get_member(
    &self,
    study_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<StudyMember>, Self::Error>> + Send + '_;

  fn list_active_members(
    &self,
    study_id: Uuid,
  ) -> impl Future<Output = Result<Vec<MemberProfile>, Self::Error>> + Send + '_;

  fn count_active_members(
    &self,
    study_id: Uuid,
  ) -> impl Future<Output = Result<u32, Self::Error>> + Send + '_;

  fn deactivate_member(
    &self,
    member_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Recount the member's completed submissions, store the resulting
  /// progress rate and return it. `None` if there is no membership row.
  fn refresh_progress(
    &self,
    study_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<u8>, Self::Error>> + Send + '_;

  // ── Curriculum ────────────────────────────────────────────────────────

  /// All day plans of a study, ordered by day number.
  fn list_day_plans(
    &self,
    study_id: Uuid,
  ) -> impl Future<Output = Result<Vec<DayPlan>, Self::Error>> + Send + '_;

  fn get_day_plan(
    &self,
    plan_id: Uuid,
  ) -> impl Future<Output = Result<Option<DayPlan>, Self::Error>> + Send + '_;

  /// Assignments of a plan, ordered by question order.
  fn list_assignments(
    &self,
    plan_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Assignment>, Self::Error>> + Send + '_;

  // ── Submissions ───────────────────────────────────────────────────────

  /// Upsert the (plan, user) submission, mark it completed and refresh the
  /// member's progress rate, all in one transaction.
  fn save_submission(
    &self,
    draft: SubmissionDraft,
  ) -> impl Future<Output = Result<RecordedSubmission, Self::Error>> + Send + '_;

  fn get_submission(
    &self,
    plan_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<Submission>, Self::Error>> + Send + '_;

  fn get_submission_by_id(
    &self,
    submission_id: Uuid,
  ) -> impl Future<Output = Result<Option<Submission>, Self::Error>> + Send + '_;

  /// A user's submissions in a study, ordered by day number.
  fn list_user_submissions(
    &self,
    study_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Submission>, Self::Error>> + Send + '_;

  /// Everyone's submissions for a plan, most recently submitted first.
  fn list_plan_submissions(
    &self,
    plan_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Submission>, Self::Error>> + Send + '_;

  // ── Comments ──────────────────────────────────────────────────────────

  fn insert_comment(
    &self,
    comment: Comment,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// A comment by id, including soft-deleted ones.
  fn get_comment(
    &self,
    comment_id: Uuid,
  ) -> impl Future<Output = Result<Option<Comment>, Self::Error>> + Send + '_;

  /// Non-deleted comments on a submission, oldest first.
  fn list_comments(
    &self,
    submission_id: Uuid,
  ) -> impl Future<Output = Result<Vec<CommentWithAuthor>, Self::Error>>
  + Send
  + '_;

  fn update_comment(
    &self,
    comment_id: Uuid,
    content: String,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn soft_delete_comment(
    &self,
    comment_id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
