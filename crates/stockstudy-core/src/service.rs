//! [`StudyService`] — the business rules of the study tracker.
//!
//! Every inbound operation goes through this type. It validates input,
//! enforces the membership and authorship invariants, and delegates
//! persistence to a [`StudyStore`].

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  comment::{Comment, CommentWithAuthor, clean_content},
  curriculum::{self, Assignment, DayPlan},
  invite::InviteCode,
  store::StudyStore,
  study::{
    Admission, CreatedStudy, MemberProfile, MemberRole, NewStudy, Study,
    StudyMember, StudyProgress, StudyStatus, StudyWithMemberCount,
  },
  submission::{NewSubmission, RecordedSubmission, Submission, SubmissionDraft},
  user::{Registration, User, hash_password, normalize_email, verify_password},
};

/// How many invite codes are drawn before a collision is reported.
pub const INVITE_CODE_ATTEMPTS: usize = 3;

type CodeSource = Box<dyn Fn() -> InviteCode + Send + Sync>;

fn lift<E: Into<Error>>(e: E) -> Error { e.into() }

pub struct StudyService<S> {
  store:        S,
  invite_codes: CodeSource,
}

impl<S: StudyStore> StudyService<S> {
  pub fn new(store: S) -> Self {
    Self::with_invite_codes(store, InviteCode::generate)
  }

  /// Use a custom invite-code generator instead of the OS RNG.
  pub fn with_invite_codes(
    store: S,
    codes: impl Fn() -> InviteCode + Send + Sync + 'static,
  ) -> Self {
    Self { store, invite_codes: Box::new(codes) }
  }

  pub fn store(&self) -> &S { &self.store }

  // ── Accounts ──────────────────────────────────────────────────────────

  pub async fn register_user(&self, registration: Registration) -> Result<User> {
    let registration = registration.normalized();
    registration.validate()?;

    if let Some(existing) = self
      .store
      .find_user_by_login(registration.username.clone())
      .await
      .map_err(lift)?
      && existing.username == registration.username
    {
      return Err(Error::Conflict("username already taken".into()));
    }
    if let Some(existing) = self
      .store
      .find_user_by_login(registration.email.clone())
      .await
      .map_err(lift)?
      && existing.email == registration.email
    {
      return Err(Error::Conflict("email already taken".into()));
    }

    let now = Utc::now();
    let user = User {
      user_id:       Uuid::new_v4(),
      username:      registration.username,
      email:         registration.email,
      password_hash: hash_password(&registration.password)?,
      photo_url:     registration.photo_url,
      created_at:    now,
      updated_at:    now,
      last_login_at: None,
    };
    self.store.insert_user(user.clone()).await.map_err(lift)?;

    info!(user_id = %user.user_id, username = %user.username, "user registered");
    Ok(user)
  }

  pub async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
    self.store.get_user(user_id).await.map_err(lift)
  }

  /// Check a username-or-email and password pair without side effects.
  pub async fn verify_credentials(&self, login: &str, password: &str) -> Result<User> {
    let login = if login.contains('@') {
      normalize_email(login)
    } else {
      login.to_owned()
    };
    let user = self
      .store
      .find_user_by_login(login)
      .await
      .map_err(lift)?
      .ok_or(Error::Unauthorized)?;
    if !verify_password(password, &user.password_hash) {
      return Err(Error::Unauthorized);
    }
    Ok(user)
  }

  /// Verify credentials and stamp the user's last login.
  pub async fn authenticate(&self, login: &str, password: &str) -> Result<User> {
    let mut user = self.verify_credentials(login, password).await?;
    let now = Utc::now();
    self.store.record_login(user.user_id, now).await.map_err(lift)?;
    user.last_login_at = Some(now);
    debug!(user_id = %user.user_id, "login recorded");
    Ok(user)
  }

  // ── Study creation ────────────────────────────────────────────────────

  /// Create a study owned by `owner_id`, together with the owner membership
  /// and the 15-day curriculum, atomically.
  pub async fn create_study(&self, input: NewStudy, owner_id: Uuid) -> Result<CreatedStudy> {
    input.validate()?;
    self
      .store
      .get_user(owner_id)
      .await
      .map_err(lift)?
      .ok_or_else(|| Error::not_found("user"))?;

    let study_id = Uuid::new_v4();
    let now = Utc::now();
    let description = input
      .description
      .as_deref()
      .map(str::trim)
      .filter(|d| !d.is_empty())
      .map(str::to_owned);

    let mut attempt = 0;
    loop {
      attempt += 1;
      let study = Study {
        study_id,
        name: input.name.trim().to_owned(),
        description: description.clone(),
        book_title: input.book_title.trim().to_owned(),
        invite_code: (self.invite_codes)(),
        start_date: input.start_date,
        end_date: input.end_date,
        owner_id,
        status: StudyStatus::Active,
        max_members: input.max_members,
        created_at: now,
        updated_at: now,
      };
      let invite_code = study.invite_code.clone();
      let owner = StudyMember::new(study_id, owner_id, MemberRole::Owner);
      let days = curriculum::seed(study_id, input.start_date);

      match self.store.insert_study(study, owner, days).await.map_err(lift) {
        Ok(()) => {
          info!(%study_id, %owner_id, %invite_code, "study created");
          return Ok(CreatedStudy { study_id, invite_code });
        }
        Err(Error::Conflict(reason)) if attempt < INVITE_CODE_ATTEMPTS => {
          warn!(%study_id, attempt, %reason, "invite code collision, retrying");
        }
        Err(e) => return Err(e),
      }
    }
  }

  // ── Membership ────────────────────────────────────────────────────────

  /// Join the study identified by `invite_code`. Returns the study id.
  pub async fn join_study(&self, invite_code: &str, user_id: Uuid) -> Result<Uuid> {
    let code =
      InviteCode::parse(invite_code).map_err(|_| Error::not_found("invite code"))?;

    self
      .store
      .get_user(user_id)
      .await
      .map_err(lift)?
      .ok_or_else(|| Error::not_found("user"))?;

    let study = self
      .store
      .find_study_by_invite_code(code)
      .await
      .map_err(lift)?
      .ok_or_else(|| Error::not_found("invite code"))?;

    let member = StudyMember::new(study.study_id, user_id, MemberRole::Member);
    match self
      .store
      .admit_member(member, study.max_members)
      .await
      .map_err(lift)?
    {
      Admission::Admitted => {
        info!(study_id = %study.study_id, %user_id, "member joined");
        Ok(study.study_id)
      }
      Admission::AlreadyMember => Err(Error::AlreadyMember),
      Admission::Full => Err(Error::StudyFull),
    }
  }

  /// Deactivate the caller's membership. The owner cannot leave; an already
  /// inactive membership reports [`Error::NotMember`].
  pub async fn leave_study(&self, study_id: Uuid, user_id: Uuid) -> Result<()> {
    let member = self
      .store
      .get_member(study_id, user_id)
      .await
      .map_err(lift)?
      .filter(|m| m.is_active)
      .ok_or(Error::NotMember)?;

    if member.is_owner() {
      return Err(Error::OwnerCannotLeave);
    }

    self.store.deactivate_member(member.member_id).await.map_err(lift)?;
    info!(%study_id, %user_id, "member left");
    Ok(())
  }

  /// Delete a study and everything attached to it. Owner only.
  pub async fn delete_study(&self, study_id: Uuid, user_id: Uuid) -> Result<()> {
    let study = self
      .store
      .get_study(study_id)
      .await
      .map_err(lift)?
      .ok_or_else(|| Error::not_found("study"))?;

    if study.owner_id != user_id {
      return Err(Error::Forbidden("only the owner can delete a study".into()));
    }

    if !self.store.delete_study(study_id).await.map_err(lift)? {
      return Err(Error::not_found("study"));
    }
    info!(%study_id, "study deleted");
    Ok(())
  }

  // ── Study reads ───────────────────────────────────────────────────────

  pub async fn get_study(&self, study_id: Uuid) -> Result<Option<Study>> {
    self.store.get_study(study_id).await.map_err(lift)
  }

  pub async fn get_study_with_member_count(
    &self,
    study_id: Uuid,
  ) -> Result<Option<StudyWithMemberCount>> {
    let Some(study) = self.get_study(study_id).await? else {
      return Ok(None);
    };
    let member_count = self
      .store
      .count_active_members(study_id)
      .await
      .map_err(lift)?;
    Ok(Some(StudyWithMemberCount { study, member_count }))
  }

  /// Studies the user is an active member of.
  pub async fn get_user_studies(&self, user_id: Uuid) -> Result<Vec<Study>> {
    let rows = self.store.list_user_studies(user_id).await.map_err(lift)?;
    Ok(rows.into_iter().map(|(study, _)| study).collect())
  }

  /// Dashboard view: each active study with the user's membership, the
  /// programme day `today` falls on and the active member count.
  pub async fn get_user_studies_with_progress(
    &self,
    user_id: Uuid,
    today: NaiveDate,
  ) -> Result<Vec<StudyProgress>> {
    let rows = self.store.list_user_studies(user_id).await.map_err(lift)?;
    let mut out = Vec::with_capacity(rows.len());
    for (study, member) in rows {
      let member_count = self
        .store
        .count_active_members(study.study_id)
        .await
        .map_err(lift)?;
      let current_day = curriculum::current_day_number(study.start_date, today);
      out.push(StudyProgress { study, member, current_day, member_count });
    }
    Ok(out)
  }

  pub async fn get_day_plans(&self, study_id: Uuid) -> Result<Vec<DayPlan>> {
    self.store.list_day_plans(study_id).await.map_err(lift)
  }

  pub async fn get_assignments(&self, plan_id: Uuid) -> Result<Vec<Assignment>> {
    self.store.list_assignments(plan_id).await.map_err(lift)
  }

  /// Active members with their display data.
  pub async fn get_study_members(&self, study_id: Uuid) -> Result<Vec<MemberProfile>> {
    self.store.list_active_members(study_id).await.map_err(lift)
  }

  pub async fn get_user_study_member(
    &self,
    user_id: Uuid,
    study_id: Uuid,
  ) -> Result<Option<StudyMember>> {
    self.store.get_member(study_id, user_id).await.map_err(lift)
  }

  // ── Submissions & progress ────────────────────────────────────────────

  /// Record (or overwrite) the caller's submission for a day plan and
  /// refresh their progress rate in the same transaction.
  pub async fn create_submission(&self, input: NewSubmission) -> Result<RecordedSubmission> {
    let plan = self
      .store
      .get_day_plan(input.plan_id)
      .await
      .map_err(lift)?
      .filter(|p| p.study_id == input.study_id)
      .ok_or_else(|| Error::not_found("day plan"))?;

    if plan.day_number != input.day_number {
      return Err(Error::invalid(format!(
        "day plan is day {}, not day {}",
        plan.day_number, input.day_number
      )));
    }

    self.require_active_member(input.study_id, input.user_id, "submit").await?;

    let assignments = self
      .store
      .list_assignments(plan.plan_id)
      .await
      .map_err(lift)?;
    input.validate_against(&assignments)?;

    let draft = SubmissionDraft {
      reflection: input.normalized_reflection(),
      plan_id:    input.plan_id,
      study_id:   input.study_id,
      user_id:    input.user_id,
      day_number: input.day_number,
      answers:    input.canonical_answers(&assignments),
      at:         Utc::now(),
    };
    let recorded = self.store.save_submission(draft).await.map_err(lift)?;

    debug!(
      submission_id = %recorded.submission.submission_id,
      day = recorded.submission.day_number,
      progress = recorded.progress_rate,
      "submission recorded"
    );
    Ok(recorded)
  }

  /// Recompute the member's progress from their completed submissions.
  pub async fn update_progress_rate(&self, study_id: Uuid, user_id: Uuid) -> Result<u8> {
    let rate = self
      .store
      .refresh_progress(study_id, user_id)
      .await
      .map_err(lift)?
      .ok_or(Error::NotMember)?;
    debug!(%study_id, %user_id, rate, "progress updated");
    Ok(rate)
  }

  pub async fn get_submission(
    &self,
    plan_id: Uuid,
    user_id: Uuid,
  ) -> Result<Option<Submission>> {
    self.store.get_submission(plan_id, user_id).await.map_err(lift)
  }

  pub async fn get_user_submissions(
    &self,
    study_id: Uuid,
    user_id: Uuid,
  ) -> Result<Vec<Submission>> {
    self
      .store
      .list_user_submissions(study_id, user_id)
      .await
      .map_err(lift)
  }

  pub async fn get_day_submissions(&self, plan_id: Uuid) -> Result<Vec<Submission>> {
    self.store.list_plan_submissions(plan_id).await.map_err(lift)
  }

  // ── Comments ──────────────────────────────────────────────────────────

  pub async fn create_comment(
    &self,
    submission_id: Uuid,
    study_id: Uuid,
    user_id: Uuid,
    content: &str,
  ) -> Result<Comment> {
    let content = clean_content(content)?;

    self
      .store
      .get_submission_by_id(submission_id)
      .await
      .map_err(lift)?
      .filter(|s| s.study_id == study_id)
      .ok_or_else(|| Error::not_found("submission"))?;

    self.require_active_member(study_id, user_id, "comment").await?;

    let comment = Comment::new(submission_id, study_id, user_id, content);
    self.store.insert_comment(comment.clone()).await.map_err(lift)?;
    debug!(comment_id = %comment.comment_id, %submission_id, "comment created");
    Ok(comment)
  }

  /// Visible comments on a submission, oldest first, with author names.
  pub async fn get_comments(&self, submission_id: Uuid) -> Result<Vec<CommentWithAuthor>> {
    self.store.list_comments(submission_id).await.map_err(lift)
  }

  /// Replace a comment's content. Author only.
  pub async fn update_comment(
    &self,
    comment_id: Uuid,
    user_id: Uuid,
    content: &str,
  ) -> Result<()> {
    let content = clean_content(content)?;
    self.authored_comment(comment_id, user_id, "edit").await?;
    self
      .store
      .update_comment(comment_id, content, Utc::now())
      .await
      .map_err(lift)
  }

  /// Soft-delete a comment. Author only.
  pub async fn delete_comment(&self, comment_id: Uuid, user_id: Uuid) -> Result<()> {
    self.authored_comment(comment_id, user_id, "delete").await?;
    self
      .store
      .soft_delete_comment(comment_id, Utc::now())
      .await
      .map_err(lift)?;
    debug!(%comment_id, "comment deleted");
    Ok(())
  }

  // ── Helpers ───────────────────────────────────────────────────────────

  async fn require_active_member(
    &self,
    study_id: Uuid,
    user_id: Uuid,
    action: &str,
  ) -> Result<StudyMember> {
    self
      .store
      .get_member(study_id, user_id)
      .await
      .map_err(lift)?
      .filter(|m| m.is_active)
      .ok_or_else(|| {
        Error::Forbidden(format!("only active members of this study can {action}"))
      })
  }

  async fn authored_comment(
    &self,
    comment_id: Uuid,
    user_id: Uuid,
    action: &str,
  ) -> Result<Comment> {
    let comment = self
      .store
      .get_comment(comment_id)
      .await
      .map_err(lift)?
      .filter(|c| !c.is_deleted)
      .ok_or_else(|| Error::not_found("comment"))?;
    if comment.user_id != user_id {
      return Err(Error::Forbidden(format!(
        "only the author can {action} this comment"
      )));
    }
    Ok(comment)
  }
}
