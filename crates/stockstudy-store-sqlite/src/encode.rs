//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`)
//! so lexical order matches chronological order. Calendar dates are
//! `YYYY-MM-DD`. UUIDs are hyphenated lowercase strings. Submission answers
//! are a compact JSON array.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::Row;
use stockstudy_core::{
  comment::{Comment, CommentWithAuthor},
  curriculum::{Assignment, DayPlan},
  invite::InviteCode,
  study::{MemberProfile, MemberRole, Study, StudyMember, StudyStatus},
  submission::{Submission, SubmissionAnswer},
  user::User,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("timestamp {s:?}: {e}")))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::Decode(format!("date {s:?}: {e}")))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn encode_status(s: StudyStatus) -> &'static str {
  match s {
    StudyStatus::Active => "active",
    StudyStatus::Completed => "completed",
    StudyStatus::Archived => "archived",
  }
}

pub fn decode_status(s: &str) -> Result<StudyStatus> {
  match s {
    "active" => Ok(StudyStatus::Active),
    "completed" => Ok(StudyStatus::Completed),
    "archived" => Ok(StudyStatus::Archived),
    other => Err(Error::Decode(format!("unknown study status: {other:?}"))),
  }
}

pub fn encode_role(r: MemberRole) -> &'static str {
  match r {
    MemberRole::Owner => "owner",
    MemberRole::Member => "member",
  }
}

pub fn decode_role(s: &str) -> Result<MemberRole> {
  match s {
    "owner" => Ok(MemberRole::Owner),
    "member" => Ok(MemberRole::Member),
    other => Err(Error::Decode(format!("unknown member role: {other:?}"))),
  }
}

// ─── Answers ─────────────────────────────────────────────────────────────────

pub fn encode_answers(answers: &[SubmissionAnswer]) -> Result<String> {
  Ok(serde_json::to_string(answers)?)
}

pub fn decode_answers(s: &str) -> Result<Vec<SubmissionAnswer>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────
//
// Each `COLUMNS` constant lists the columns `from_row` expects, in order, with
// the table alias used throughout `store.rs`. `from_row` takes the index of
// the first column so joined rows can be split.

pub const USER_COLUMNS: &str = "u.user_id, u.username, u.email, u.password_hash, \
   u.photo_url, u.created_at, u.updated_at, u.last_login_at";

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:       String,
  pub username:      String,
  pub email:         String,
  pub password_hash: String,
  pub photo_url:     Option<String>,
  pub created_at:    String,
  pub updated_at:    String,
  pub last_login_at: Option<String>,
}

impl RawUser {
  pub fn from_row(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(at)?,
      username:      row.get(at + 1)?,
      email:         row.get(at + 2)?,
      password_hash: row.get(at + 3)?,
      photo_url:     row.get(at + 4)?,
      created_at:    row.get(at + 5)?,
      updated_at:    row.get(at + 6)?,
      last_login_at: row.get(at + 7)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:       decode_uuid(&self.user_id)?,
      username:      self.username,
      email:         self.email,
      password_hash: self.password_hash,
      photo_url:     self.photo_url,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
      last_login_at: self.last_login_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

pub const STUDY_COLUMNS: &str = "s.study_id, s.name, s.description, s.book_title, \
   s.invite_code, s.start_date, s.end_date, s.owner_id, s.status, \
   s.max_members, s.created_at, s.updated_at";

pub const STUDY_COLUMN_COUNT: usize = 12;

/// Raw strings read directly from a `studies` row.
pub struct RawStudy {
  pub study_id:    String,
  pub name:        String,
  pub description: Option<String>,
  pub book_title:  String,
  pub invite_code: String,
  pub start_date:  String,
  pub end_date:    String,
  pub owner_id:    String,
  pub status:      String,
  pub max_members: u32,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawStudy {
  pub fn from_row(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      study_id:    row.get(at)?,
      name:        row.get(at + 1)?,
      description: row.get(at + 2)?,
      book_title:  row.get(at + 3)?,
      invite_code: row.get(at + 4)?,
      start_date:  row.get(at + 5)?,
      end_date:    row.get(at + 6)?,
      owner_id:    row.get(at + 7)?,
      status:      row.get(at + 8)?,
      max_members: row.get(at + 9)?,
      created_at:  row.get(at + 10)?,
      updated_at:  row.get(at + 11)?,
    })
  }

  pub fn into_study(self) -> Result<Study> {
    Ok(Study {
      study_id:    decode_uuid(&self.study_id)?,
      name:        self.name,
      description: self.description,
      book_title:  self.book_title,
      invite_code: InviteCode::from_stored(self.invite_code),
      start_date:  decode_date(&self.start_date)?,
      end_date:    decode_date(&self.end_date)?,
      owner_id:    decode_uuid(&self.owner_id)?,
      status:      decode_status(&self.status)?,
      max_members: self.max_members,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

pub const MEMBER_COLUMNS: &str = "m.member_id, m.study_id, m.user_id, m.role, \
   m.joined_at, m.is_active, m.progress_rate";

pub const MEMBER_COLUMN_COUNT: usize = 7;

/// Raw strings read directly from a `study_members` row.
pub struct RawMember {
  pub member_id:     String,
  pub study_id:      String,
  pub user_id:       String,
  pub role:          String,
  pub joined_at:     String,
  pub is_active:     bool,
  pub progress_rate: u8,
}

impl RawMember {
  pub fn from_row(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      member_id:     row.get(at)?,
      study_id:      row.get(at + 1)?,
      user_id:       row.get(at + 2)?,
      role:          row.get(at + 3)?,
      joined_at:     row.get(at + 4)?,
      is_active:     row.get(at + 5)?,
      progress_rate: row.get(at + 6)?,
    })
  }

  pub fn into_member(self) -> Result<StudyMember> {
    Ok(StudyMember {
      member_id:     decode_uuid(&self.member_id)?,
      study_id:      decode_uuid(&self.study_id)?,
      user_id:       decode_uuid(&self.user_id)?,
      role:          decode_role(&self.role)?,
      joined_at:     decode_dt(&self.joined_at)?,
      is_active:     self.is_active,
      progress_rate: self.progress_rate,
    })
  }
}

/// A membership row joined with `users.username, users.photo_url`.
pub struct RawMemberProfile {
  pub member:    RawMember,
  pub username:  String,
  pub photo_url: Option<String>,
}

impl RawMemberProfile {
  pub fn into_profile(self) -> Result<MemberProfile> {
    Ok(MemberProfile {
      member:    self.member.into_member()?,
      username:  self.username,
      photo_url: self.photo_url,
    })
  }
}

pub const PLAN_COLUMNS: &str = "p.plan_id, p.study_id, p.day_number, p.title, \
   p.learning_goal, p.chapter_info, p.description, p.target_date";

/// Raw strings read directly from a `day_plans` row.
pub struct RawPlan {
  pub plan_id:       String,
  pub study_id:      String,
  pub day_number:    u8,
  pub title:         String,
  pub learning_goal: String,
  pub chapter_info:  String,
  pub description:   String,
  pub target_date:   String,
}

impl RawPlan {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      plan_id:       row.get(0)?,
      study_id:      row.get(1)?,
      day_number:    row.get(2)?,
      title:         row.get(3)?,
      learning_goal: row.get(4)?,
      chapter_info:  row.get(5)?,
      description:   row.get(6)?,
      target_date:   row.get(7)?,
    })
  }

  pub fn into_plan(self) -> Result<DayPlan> {
    Ok(DayPlan {
      plan_id:       decode_uuid(&self.plan_id)?,
      study_id:      decode_uuid(&self.study_id)?,
      day_number:    self.day_number,
      title:         self.title,
      learning_goal: self.learning_goal,
      chapter_info:  self.chapter_info,
      description:   self.description,
      target_date:   decode_date(&self.target_date)?,
    })
  }
}

/// Raw strings read directly from an `assignments` row.
pub struct RawAssignment {
  pub assignment_id:  String,
  pub plan_id:        String,
  pub question_text:  String,
  pub question_order: u8,
  pub is_required:    bool,
}

impl RawAssignment {
  pub fn into_assignment(self) -> Result<Assignment> {
    Ok(Assignment {
      assignment_id:  decode_uuid(&self.assignment_id)?,
      plan_id:        decode_uuid(&self.plan_id)?,
      question_text:  self.question_text,
      question_order: self.question_order,
      is_required:    self.is_required,
    })
  }
}

pub const SUBMISSION_COLUMNS: &str = "x.submission_id, x.plan_id, x.study_id, \
   x.user_id, x.day_number, x.answers_json, x.reflection, x.is_completed, \
   x.submitted_at, x.created_at, x.updated_at";

/// Raw strings read directly from a `submissions` row.
pub struct RawSubmission {
  pub submission_id: String,
  pub plan_id:       String,
  pub study_id:      String,
  pub user_id:       String,
  pub day_number:    u8,
  pub answers_json:  String,
  pub reflection:    Option<String>,
  pub is_completed:  bool,
  pub submitted_at:  Option<String>,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawSubmission {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      submission_id: row.get(0)?,
      plan_id:       row.get(1)?,
      study_id:      row.get(2)?,
      user_id:       row.get(3)?,
      day_number:    row.get(4)?,
      answers_json:  row.get(5)?,
      reflection:    row.get(6)?,
      is_completed:  row.get(7)?,
      submitted_at:  row.get(8)?,
      created_at:    row.get(9)?,
      updated_at:    row.get(10)?,
    })
  }

  pub fn into_submission(self) -> Result<Submission> {
    Ok(Submission {
      submission_id: decode_uuid(&self.submission_id)?,
      plan_id:       decode_uuid(&self.plan_id)?,
      study_id:      decode_uuid(&self.study_id)?,
      user_id:       decode_uuid(&self.user_id)?,
      day_number:    self.day_number,
      answers:       decode_answers(&self.answers_json)?,
      reflection:    self.reflection,
      is_completed:  self.is_completed,
      submitted_at:  self.submitted_at.as_deref().map(decode_dt).transpose()?,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

pub const COMMENT_COLUMNS: &str = "c.comment_id, c.submission_id, c.study_id, \
   c.user_id, c.content, c.is_deleted, c.created_at, c.updated_at";

/// Raw strings read directly from a `comments` row.
pub struct RawComment {
  pub comment_id:    String,
  pub submission_id: String,
  pub study_id:      String,
  pub user_id:       String,
  pub content:       String,
  pub is_deleted:    bool,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawComment {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      comment_id:    row.get(0)?,
      submission_id: row.get(1)?,
      study_id:      row.get(2)?,
      user_id:       row.get(3)?,
      content:       row.get(4)?,
      is_deleted:    row.get(5)?,
      created_at:    row.get(6)?,
      updated_at:    row.get(7)?,
    })
  }

  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      comment_id:    decode_uuid(&self.comment_id)?,
      submission_id: decode_uuid(&self.submission_id)?,
      study_id:      decode_uuid(&self.study_id)?,
      user_id:       decode_uuid(&self.user_id)?,
      content:       self.content,
      is_deleted:    self.is_deleted,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

/// A comment row joined with its author's `username, photo_url`.
pub struct RawCommentWithAuthor {
  pub comment:   RawComment,
  pub username:  String,
  pub photo_url: Option<String>,
}

impl RawCommentWithAuthor {
  pub fn into_comment_with_author(self) -> Result<CommentWithAuthor> {
    Ok(CommentWithAuthor {
      comment:   self.comment.into_comment()?,
      username:  self.username,
      photo_url: self.photo_url,
    })
  }
}
