//! Comments on submissions. Deleting sets a flag; content is kept.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

pub const MAX_COMMENT_LEN: usize = 2000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
  pub comment_id:    Uuid,
  pub submission_id: Uuid,
  pub study_id:      Uuid,
  pub user_id:       Uuid,
  pub content:       String,
  pub is_deleted:    bool,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

impl Comment {
  pub fn new(
    submission_id: Uuid,
    study_id: Uuid,
    user_id: Uuid,
    content: String,
  ) -> Self {
    let now = Utc::now();
    Self {
      comment_id: Uuid::new_v4(),
      submission_id,
      study_id,
      user_id,
      content,
      is_deleted: false,
      created_at: now,
      updated_at: now,
    }
  }
}

/// A comment enriched with its author's display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentWithAuthor {
  #[serde(flatten)]
  pub comment:   Comment,
  pub username:  String,
  pub photo_url: Option<String>,
}

/// Trim and bound comment text.
pub fn clean_content(content: &str) -> Result<String> {
  let content = content.trim();
  if content.is_empty() {
    return Err(Error::invalid("comment must not be empty"));
  }
  if content.chars().count() > MAX_COMMENT_LEN {
    return Err(Error::invalid(format!(
      "comment must be at most {MAX_COMMENT_LEN} characters"
    )));
  }
  Ok(content.to_owned())
}
