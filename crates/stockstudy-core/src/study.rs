//! Studies and their memberships.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, invite::InviteCode};

pub const MIN_MEMBERS: u32 = 1;
pub const MAX_MEMBERS: u32 = 50;

// ─── Study ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudyStatus {
  #[default]
  Active,
  Completed,
  Archived,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Study {
  pub study_id:    Uuid,
  pub name:        String,
  pub description: Option<String>,
  pub book_title:  String,
  pub invite_code: InviteCode,
  pub start_date:  NaiveDate,
  pub end_date:    NaiveDate,
  pub owner_id:    Uuid,
  pub status:      StudyStatus,
  pub max_members: u32,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

/// Input to [`crate::service::StudyService::create_study`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewStudy {
  pub name:        String,
  #[serde(default)]
  pub description: Option<String>,
  pub book_title:  String,
  pub start_date:  NaiveDate,
  pub end_date:    NaiveDate,
  pub max_members: u32,
}

impl NewStudy {
  pub fn validate(&self) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(Error::invalid("study name is required"));
    }
    if self.book_title.trim().is_empty() {
      return Err(Error::invalid("book title is required"));
    }
    if self.end_date < self.start_date {
      return Err(Error::invalid("end date must not be before start date"));
    }
    if !(MIN_MEMBERS..=MAX_MEMBERS).contains(&self.max_members) {
      return Err(Error::invalid(format!(
        "max members must be between {MIN_MEMBERS} and {MAX_MEMBERS}"
      )));
    }
    Ok(())
  }
}

/// What the caller gets back from a successful study creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedStudy {
  pub study_id:    Uuid,
  pub invite_code: InviteCode,
}

// ─── Membership ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
  Owner,
  Member,
}

/// One row per (study, user). Leaving flips `is_active`; the row stays so
/// historical submissions and progress remain attributable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyMember {
  pub member_id:     Uuid,
  pub study_id:      Uuid,
  pub user_id:       Uuid,
  pub role:          MemberRole,
  pub joined_at:     DateTime<Utc>,
  pub is_active:     bool,
  /// 0–100.
  pub progress_rate: u8,
}

impl StudyMember {
  pub fn new(study_id: Uuid, user_id: Uuid, role: MemberRole) -> Self {
    Self {
      member_id: Uuid::new_v4(),
      study_id,
      user_id,
      role,
      joined_at: Utc::now(),
      is_active: true,
      progress_rate: 0,
    }
  }

  pub fn is_owner(&self) -> bool { self.role == MemberRole::Owner }
}

/// A membership joined with the member's display data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberProfile {
  #[serde(flatten)]
  pub member:    StudyMember,
  pub username:  String,
  pub photo_url: Option<String>,
}

/// Result of a capacity-checked membership insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
  Admitted,
  AlreadyMember,
  Full,
}

// ─── Read models ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyWithMemberCount {
  pub study:        Study,
  pub member_count: u32,
}

/// Dashboard entry: a study the user is active in, with their own progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyProgress {
  pub study:        Study,
  pub member:       StudyMember,
  pub current_day:  u8,
  pub member_count: u32,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn new_study() -> NewStudy {
    NewStudy {
      name:        "Value investors".into(),
      description: None,
      book_title:  "The Intelligent Investor".into(),
      start_date:  NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
      end_date:    NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(),
      max_members: 10,
    }
  }

  #[test]
  fn valid_study_passes() { new_study().validate().unwrap(); }

  #[test]
  fn blank_name_is_rejected() {
    let mut s = new_study();
    s.name = "   ".into();
    assert!(matches!(s.validate(), Err(Error::Validation(_))));
  }

  #[test]
  fn reversed_dates_are_rejected() {
    let mut s = new_study();
    s.end_date = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
    assert!(s.validate().is_err());
  }

  #[test]
  fn member_limit_bounds() {
    let mut s = new_study();
    s.max_members = 0;
    assert!(s.validate().is_err());
    s.max_members = 51;
    assert!(s.validate().is_err());
    s.max_members = 1;
    assert!(s.validate().is_ok());
    s.max_members = 50;
    assert!(s.validate().is_ok());
  }
}
