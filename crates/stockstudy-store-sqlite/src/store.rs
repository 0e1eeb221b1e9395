//! [`SqliteStore`] — the SQLite implementation of [`StudyStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use stockstudy_core::{
  comment::{Comment, CommentWithAuthor},
  curriculum::{Assignment, DayPlan, SeededDay},
  invite::InviteCode,
  progress::progress_rate,
  study::{Admission, MemberProfile, Study, StudyMember},
  store::StudyStore,
  submission::{RecordedSubmission, Submission, SubmissionDraft},
  user::User,
};

use crate::{
  Result,
  encode::{
    COMMENT_COLUMNS, MEMBER_COLUMN_COUNT, MEMBER_COLUMNS, PLAN_COLUMNS,
    RawAssignment, RawComment, RawCommentWithAuthor, RawMember,
    RawMemberProfile, RawPlan, RawStudy, RawSubmission, RawUser,
    STUDY_COLUMN_COUNT, STUDY_COLUMNS, SUBMISSION_COLUMNS, USER_COLUMNS,
    encode_answers, encode_date, encode_dt, encode_role, encode_status,
    encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A study store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection handle is shared.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, used by tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn query_user(
    &self,
    clause: &'static str,
    key: String,
  ) -> Result<Option<User>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users u WHERE {clause}"),
              rusqlite::params![key],
              |row| RawUser::from_row(row, 0),
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawUser::into_user).transpose()
  }

  async fn query_study(
    &self,
    clause: &'static str,
    key: String,
  ) -> Result<Option<Study>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {STUDY_COLUMNS} FROM studies s WHERE {clause}"),
              rusqlite::params![key],
              |row| RawStudy::from_row(row, 0),
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawStudy::into_study).transpose()
  }

  async fn query_submissions(
    &self,
    clause: &'static str,
    keys: Vec<String>,
  ) -> Result<Vec<Submission>> {
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SUBMISSION_COLUMNS} FROM submissions x {clause}"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(keys), RawSubmission::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawSubmission::into_submission).collect()
  }
}

/// Recount a member's completed submissions and store the derived rate.
/// Returns `None` when there is no (study, user) membership row.
fn recompute_progress(
  conn: &Connection,
  study_id: &str,
  user_id: &str,
) -> rusqlite::Result<Option<u8>> {
  let completed: u32 = conn.query_row(
    "SELECT COUNT(*) FROM submissions
     WHERE study_id = ?1 AND user_id = ?2 AND is_completed = 1",
    rusqlite::params![study_id, user_id],
    |r| r.get(0),
  )?;
  let rate = progress_rate(completed);
  let updated = conn.execute(
    "UPDATE study_members SET progress_rate = ?3
     WHERE study_id = ?1 AND user_id = ?2",
    rusqlite::params![study_id, user_id, rate],
  )?;
  Ok((updated > 0).then_some(rate))
}

fn insert_member(conn: &Connection, m: &StudyMember) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO study_members (
       member_id, study_id, user_id, role, joined_at, is_active, progress_rate
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    rusqlite::params![
      encode_uuid(m.member_id),
      encode_uuid(m.study_id),
      encode_uuid(m.user_id),
      encode_role(m.role),
      encode_dt(m.joined_at),
      m.is_active,
      m.progress_rate,
    ],
  )?;
  Ok(())
}

// ─── StudyStore impl ─────────────────────────────────────────────────────────

impl StudyStore for SqliteStore {
  type Error = crate::Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn insert_user(&self, user: User) -> Result<()> {
    let id_str      = encode_uuid(user.user_id);
    let created_str = encode_dt(user.created_at);
    let updated_str = encode_dt(user.updated_at);
    let login_str   = user.last_login_at.map(encode_dt);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (
             user_id, username, email, password_hash, photo_url,
             created_at, updated_at, last_login_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str,
            user.username,
            user.email,
            user.password_hash,
            user.photo_url,
            created_str,
            updated_str,
            login_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
    self.query_user("u.user_id = ?1", encode_uuid(user_id)).await
  }

  async fn find_user_by_login(&self, login: String) -> Result<Option<User>> {
    self
      .query_user("u.username = ?1 OR u.email = ?1", login)
      .await
  }

  async fn record_login(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<()> {
    let id_str = encode_uuid(user_id);
    let at_str = encode_dt(at);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE users SET last_login_at = ?2 WHERE user_id = ?1",
          rusqlite::params![id_str, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Studies ───────────────────────────────────────────────────────────────

  async fn insert_study(
    &self,
    study: Study,
    owner: StudyMember,
    curriculum: Vec<SeededDay>,
  ) -> Result<()> {
    let study_id_str = encode_uuid(study.study_id);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        tx.execute(
          "INSERT INTO studies (
             study_id, name, description, book_title, invite_code,
             start_date, end_date, owner_id, status, max_members,
             created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
          rusqlite::params![
            study_id_str,
            study.name,
            study.description,
            study.book_title,
            study.invite_code.as_str(),
            encode_date(study.start_date),
            encode_date(study.end_date),
            encode_uuid(study.owner_id),
            encode_status(study.status),
            study.max_members,
            encode_dt(study.created_at),
            encode_dt(study.updated_at),
          ],
        )?;

        insert_member(&tx, &owner)?;

        {
          let mut plan_stmt = tx.prepare(
            "INSERT INTO day_plans (
               plan_id, study_id, day_number, title, learning_goal,
               chapter_info, description, target_date
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          )?;
          let mut assignment_stmt = tx.prepare(
            "INSERT INTO assignments (
               assignment_id, plan_id, question_text, question_order, is_required
             ) VALUES (?1, ?2, ?3, ?4, ?5)",
          )?;

          for SeededDay { plan, assignments } in &curriculum {
            let plan_id_str = encode_uuid(plan.plan_id);
            plan_stmt.execute(rusqlite::params![
              plan_id_str,
              study_id_str,
              plan.day_number,
              plan.title,
              plan.learning_goal,
              plan.chapter_info,
              plan.description,
              encode_date(plan.target_date),
            ])?;
            for a in assignments {
              assignment_stmt.execute(rusqlite::params![
                encode_uuid(a.assignment_id),
                plan_id_str,
                a.question_text,
                a.question_order,
                a.is_required,
              ])?;
            }
          }
        }

        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_study(&self, study_id: Uuid) -> Result<Option<Study>> {
    self
      .query_study("s.study_id = ?1", encode_uuid(study_id))
      .await
  }

  async fn find_study_by_invite_code(
    &self,
    code: InviteCode,
  ) -> Result<Option<Study>> {
    self
      .query_study("s.invite_code = ?1", code.as_str().to_owned())
      .await
  }

  async fn delete_study(&self, study_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(study_id);
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM studies WHERE study_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;
    Ok(deleted > 0)
  }

  async fn list_user_studies(
    &self,
    user_id: Uuid,
  ) -> Result<Vec<(Study, StudyMember)>> {
    let id_str = encode_uuid(user_id);
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {STUDY_COLUMNS}, {MEMBER_COLUMNS}
           FROM study_members m
           JOIN studies s ON s.study_id = m.study_id
           WHERE m.user_id = ?1 AND m.is_active = 1
           ORDER BY s.start_date DESC, s.created_at DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok((
              RawStudy::from_row(row, 0)?,
              RawMember::from_row(row, STUDY_COLUMN_COUNT)?,
            ))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(s, m)| -> Result<_> { Ok((s.into_study()?, m.into_member()?)) })
      .collect()
  }

  // ── Memberships ───────────────────────────────────────────────────────────

  async fn admit_member(
    &self,
    member: StudyMember,
    max_members: u32,
  ) -> Result<Admission> {
    let admission = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let study_id_str = encode_uuid(member.study_id);

        let existing: Option<bool> = tx
          .query_row(
            "SELECT 1 FROM study_members WHERE study_id = ?1 AND user_id = ?2",
            rusqlite::params![study_id_str, encode_uuid(member.user_id)],
            |_| Ok(true),
          )
          .optional()?;
        if existing.is_some() {
          return Ok(Admission::AlreadyMember);
        }

        let active: u32 = tx.query_row(
          "SELECT COUNT(*) FROM study_members WHERE study_id = ?1 AND is_active = 1",
          rusqlite::params![study_id_str],
          |r| r.get(0),
        )?;
        if active >= max_members {
          return Ok(Admission::Full);
        }

        insert_member(&tx, &member)?;
        tx.commit()?;
        Ok(Admission::Admitted)
      })
      .await?;
    Ok(admission)
  }

  async fn get_member(
    &self,
    study_id: Uuid,
    user_id: Uuid,
  ) -> Result<Option<StudyMember>> {
    let study_str = encode_uuid(study_id);
    let user_str  = encode_uuid(user_id);
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {MEMBER_COLUMNS} FROM study_members m
                 WHERE m.study_id = ?1 AND m.user_id = ?2"
              ),
              rusqlite::params![study_str, user_str],
              |row| RawMember::from_row(row, 0),
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawMember::into_member).transpose()
  }

  async fn list_active_members(
    &self,
    study_id: Uuid,
  ) -> Result<Vec<MemberProfile>> {
    let id_str = encode_uuid(study_id);
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MEMBER_COLUMNS}, u.username, u.photo_url
           FROM study_members m
           JOIN users u ON u.user_id = m.user_id
           WHERE m.study_id = ?1 AND m.is_active = 1
           ORDER BY m.joined_at, m.rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawMemberProfile {
              member:    RawMember::from_row(row, 0)?,
              username:  row.get(MEMBER_COLUMN_COUNT)?,
              photo_url: row.get(MEMBER_COLUMN_COUNT + 1)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawMemberProfile::into_profile).collect()
  }

  async fn count_active_members(&self, study_id: Uuid) -> Result<u32> {
    let id_str = encode_uuid(study_id);
    let count = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM study_members WHERE study_id = ?1 AND is_active = 1",
          rusqlite::params![id_str],
          |r| r.get::<_, u32>(0),
        )?)
      })
      .await?;
    Ok(count)
  }

  async fn deactivate_member(&self, member_id: Uuid) -> Result<()> {
    let id_str = encode_uuid(member_id);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE study_members SET is_active = 0 WHERE member_id = ?1",
          rusqlite::params![id_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn refresh_progress(
    &self,
    study_id: Uuid,
    user_id: Uuid,
  ) -> Result<Option<u8>> {
    let study_str = encode_uuid(study_id);
    let user_str  = encode_uuid(user_id);
    let rate = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let rate = recompute_progress(&tx, &study_str, &user_str)?;
        tx.commit()?;
        Ok(rate)
      })
      .await?;
    Ok(rate)
  }

  // ── Curriculum ────────────────────────────────────────────────────────────

  async fn list_day_plans(&self, study_id: Uuid) -> Result<Vec<DayPlan>> {
    let id_str = encode_uuid(study_id);
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PLAN_COLUMNS} FROM day_plans p
           WHERE p.study_id = ?1 ORDER BY p.day_number"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawPlan::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawPlan::into_plan).collect()
  }

  async fn get_day_plan(&self, plan_id: Uuid) -> Result<Option<DayPlan>> {
    let id_str = encode_uuid(plan_id);
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {PLAN_COLUMNS} FROM day_plans p WHERE p.plan_id = ?1"),
              rusqlite::params![id_str],
              RawPlan::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawPlan::into_plan).transpose()
  }

  async fn list_assignments(&self, plan_id: Uuid) -> Result<Vec<Assignment>> {
    let id_str = encode_uuid(plan_id);
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT assignment_id, plan_id, question_text, question_order, is_required
           FROM assignments WHERE plan_id = ?1 ORDER BY question_order",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawAssignment {
              assignment_id:  row.get(0)?,
              plan_id:        row.get(1)?,
              question_text:  row.get(2)?,
              question_order: row.get(3)?,
              is_required:    row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawAssignment::into_assignment).collect()
  }

  // ── Submissions ───────────────────────────────────────────────────────────

  async fn save_submission(
    &self,
    draft: SubmissionDraft,
  ) -> Result<RecordedSubmission> {
    let fresh_id_str = encode_uuid(Uuid::new_v4());
    let plan_str     = encode_uuid(draft.plan_id);
    let study_str    = encode_uuid(draft.study_id);
    let user_str     = encode_uuid(draft.user_id);
    let answers_str  = encode_answers(&draft.answers)?;
    let at_str       = encode_dt(draft.at);
    let day_number   = draft.day_number;
    let reflection   = draft.reflection;

    let (raw, rate) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        // An existing (plan, user) row keeps its id and created_at.
        tx.execute(
          "INSERT INTO submissions (
             submission_id, plan_id, study_id, user_id, day_number,
             answers_json, reflection, is_completed, submitted_at,
             created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8, ?8, ?8)
           ON CONFLICT (plan_id, user_id) DO UPDATE SET
             answers_json = excluded.answers_json,
             reflection   = excluded.reflection,
             is_completed = 1,
             submitted_at = excluded.submitted_at,
             updated_at   = excluded.updated_at",
          rusqlite::params![
            fresh_id_str,
            plan_str,
            study_str,
            user_str,
            day_number,
            answers_str,
            reflection,
            at_str,
          ],
        )?;

        let raw = tx.query_row(
          &format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions x
             WHERE x.plan_id = ?1 AND x.user_id = ?2"
          ),
          rusqlite::params![plan_str, user_str],
          RawSubmission::from_row,
        )?;

        let rate = recompute_progress(&tx, &study_str, &user_str)?.unwrap_or(0);
        tx.commit()?;
        Ok((raw, rate))
      })
      .await?;

    Ok(RecordedSubmission {
      submission:    raw.into_submission()?,
      progress_rate: rate,
    })
  }

  async fn get_submission(
    &self,
    plan_id: Uuid,
    user_id: Uuid,
  ) -> Result<Option<Submission>> {
    let mut found = self
      .query_submissions("WHERE x.plan_id = ?1 AND x.user_id = ?2", vec![
        encode_uuid(plan_id),
        encode_uuid(user_id),
      ])
      .await?;
    Ok(found.pop())
  }

  async fn get_submission_by_id(
    &self,
    submission_id: Uuid,
  ) -> Result<Option<Submission>> {
    let mut found = self
      .query_submissions("WHERE x.submission_id = ?1", vec![encode_uuid(
        submission_id,
      )])
      .await?;
    Ok(found.pop())
  }

  async fn list_user_submissions(
    &self,
    study_id: Uuid,
    user_id: Uuid,
  ) -> Result<Vec<Submission>> {
    self
      .query_submissions(
        "WHERE x.study_id = ?1 AND x.user_id = ?2 ORDER BY x.day_number",
        vec![encode_uuid(study_id), encode_uuid(user_id)],
      )
      .await
  }

  async fn list_plan_submissions(&self, plan_id: Uuid) -> Result<Vec<Submission>> {
    self
      .query_submissions(
        "WHERE x.plan_id = ?1 ORDER BY x.submitted_at DESC, x.rowid DESC",
        vec![encode_uuid(plan_id)],
      )
      .await
  }

  // ── Comments ──────────────────────────────────────────────────────────────

  async fn insert_comment(&self, comment: Comment) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO comments (
             comment_id, submission_id, study_id, user_id, content,
             is_deleted, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            encode_uuid(comment.comment_id),
            encode_uuid(comment.submission_id),
            encode_uuid(comment.study_id),
            encode_uuid(comment.user_id),
            comment.content,
            comment.is_deleted,
            encode_dt(comment.created_at),
            encode_dt(comment.updated_at),
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_comment(&self, comment_id: Uuid) -> Result<Option<Comment>> {
    let id_str = encode_uuid(comment_id);
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {COMMENT_COLUMNS} FROM comments c WHERE c.comment_id = ?1"),
              rusqlite::params![id_str],
              RawComment::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawComment::into_comment).transpose()
  }

  async fn list_comments(
    &self,
    submission_id: Uuid,
  ) -> Result<Vec<CommentWithAuthor>> {
    let id_str = encode_uuid(submission_id);
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {COMMENT_COLUMNS}, u.username, u.photo_url
           FROM comments c
           JOIN users u ON u.user_id = c.user_id
           WHERE c.submission_id = ?1 AND c.is_deleted = 0
           ORDER BY c.created_at, c.rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawCommentWithAuthor {
              comment:   RawComment::from_row(row)?,
              username:  row.get(8)?,
              photo_url: row.get(9)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws
      .into_iter()
      .map(RawCommentWithAuthor::into_comment_with_author)
      .collect()
  }

  async fn update_comment(
    &self,
    comment_id: Uuid,
    content: String,
    at: DateTime<Utc>,
  ) -> Result<()> {
    let id_str = encode_uuid(comment_id);
    let at_str = encode_dt(at);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE comments SET content = ?2, updated_at = ?3 WHERE comment_id = ?1",
          rusqlite::params![id_str, content, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn soft_delete_comment(
    &self,
    comment_id: Uuid,
    at: DateTime<Utc>,
  ) -> Result<()> {
    let id_str = encode_uuid(comment_id);
    let at_str = encode_dt(at);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE comments SET is_deleted = 1, updated_at = ?2 WHERE comment_id = ?1",
          rusqlite::params![id_str, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
