//! Submissions — a member's answers and reflection for one day plan.
//!
//! There is at most one submission per (plan, user); resubmitting overwrites
//! the previous answers.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, curriculum::Assignment};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionAnswer {
  pub assignment_id: Uuid,
  pub question_text: String,
  pub answer_text:   String,
  pub is_required:   bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
  pub submission_id: Uuid,
  pub plan_id:       Uuid,
  pub study_id:      Uuid,
  pub user_id:       Uuid,
  pub day_number:    u8,
  pub answers:       Vec<SubmissionAnswer>,
  pub reflection:    Option<String>,
  pub is_completed:  bool,
  pub submitted_at:  Option<DateTime<Utc>>,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

/// Input to [`crate::service::StudyService::create_submission`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewSubmission {
  pub plan_id:    Uuid,
  pub study_id:   Uuid,
  pub user_id:    Uuid,
  pub day_number: u8,
  pub answers:    Vec<SubmissionAnswer>,
  #[serde(default)]
  pub reflection: Option<String>,
}

impl NewSubmission {
  /// Check the answers against the plan's assignments.
  ///
  /// Every answer must reference one of `assignments`, no assignment may be
  /// answered twice, and every required assignment needs a non-blank answer.
  pub fn validate_against(&self, assignments: &[Assignment]) -> Result<()> {
    let known: HashSet<Uuid> =
      assignments.iter().map(|a| a.assignment_id).collect();

    let mut seen = HashSet::new();
    for answer in &self.answers {
      if !known.contains(&answer.assignment_id) {
        return Err(Error::invalid(format!(
          "assignment {} does not belong to this day plan",
          answer.assignment_id
        )));
      }
      if !seen.insert(answer.assignment_id) {
        return Err(Error::invalid(format!(
          "assignment {} is answered more than once",
          answer.assignment_id
        )));
      }
    }

    for assignment in assignments.iter().filter(|a| a.is_required) {
      let answered = self.answers.iter().any(|ans| {
        ans.assignment_id == assignment.assignment_id
          && !ans.answer_text.trim().is_empty()
      });
      if !answered {
        return Err(Error::invalid(format!(
          "question {} is required",
          assignment.question_order
        )));
      }
    }
    Ok(())
  }

  /// The answers as they are stored: question text and required flag come
  /// from `assignments`, only the answer text from the caller, ordered by
  /// question order. Call after [`Self::validate_against`].
  pub fn canonical_answers(&self, assignments: &[Assignment]) -> Vec<SubmissionAnswer> {
    let mut ordered: Vec<&Assignment> = assignments.iter().collect();
    ordered.sort_by_key(|a| a.question_order);
    ordered
      .into_iter()
      .filter_map(|assignment| {
        self
          .answers
          .iter()
          .find(|ans| ans.assignment_id == assignment.assignment_id)
          .map(|ans| SubmissionAnswer {
            assignment_id: assignment.assignment_id,
            question_text: assignment.question_text.clone(),
            answer_text:   ans.answer_text.clone(),
            is_required:   assignment.is_required,
          })
      })
      .collect()
  }

  /// Blank reflections are stored as absent.
  pub fn normalized_reflection(&self) -> Option<String> {
    self
      .reflection
      .as_deref()
      .map(str::trim)
      .filter(|r| !r.is_empty())
      .map(str::to_owned)
  }
}

/// What the recorder hands to the store: a validated submission plus the
/// timestamp it is recorded at.
#[derive(Debug, Clone)]
pub struct SubmissionDraft {
  pub plan_id:    Uuid,
  pub study_id:   Uuid,
  pub user_id:    Uuid,
  pub day_number: u8,
  pub answers:    Vec<SubmissionAnswer>,
  pub reflection: Option<String>,
  pub at:         DateTime<Utc>,
}

/// A stored submission together with the member's recomputed progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedSubmission {
  pub submission:    Submission,
  pub progress_rate: u8,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn assignments(plan_id: Uuid) -> Vec<Assignment> {
    [(1, true), (2, true), (3, false)]
      .into_iter()
      .map(|(order, required)| Assignment {
        assignment_id:  Uuid::new_v4(),
        plan_id,
        question_text:  format!("Question {order}"),
        question_order: order,
        is_required:    required,
      })
      .collect()
  }

  fn answer(a: &Assignment, text: &str) -> SubmissionAnswer {
    SubmissionAnswer {
      assignment_id: a.assignment_id,
      question_text: a.question_text.clone(),
      answer_text:   text.into(),
      is_required:   a.is_required,
    }
  }

  fn submission(answers: Vec<SubmissionAnswer>) -> NewSubmission {
    NewSubmission {
      plan_id: Uuid::new_v4(),
      study_id: Uuid::new_v4(),
      user_id: Uuid::new_v4(),
      day_number: 5,
      answers,
      reflection: None,
    }
  }

  #[test]
  fn required_answered_optional_blank_is_accepted() {
    let a = assignments(Uuid::new_v4());
    let s = submission(vec![
      answer(&a[0], "P/E ratios"),
      answer(&a[1], "Screen for cheap stocks"),
      answer(&a[2], ""),
    ]);
    s.validate_against(&a).unwrap();
  }

  #[test]
  fn optional_answer_may_be_omitted() {
    let a = assignments(Uuid::new_v4());
    let s = submission(vec![answer(&a[0], "x"), answer(&a[1], "y")]);
    s.validate_against(&a).unwrap();
  }

  #[test]
  fn blank_required_answer_is_rejected() {
    let a = assignments(Uuid::new_v4());
    let s = submission(vec![answer(&a[0], "x"), answer(&a[1], "   ")]);
    let err = s.validate_against(&a).unwrap_err();
    assert!(matches!(err, Error::Validation(ref m) if m.contains("question 2")));
  }

  #[test]
  fn foreign_assignment_is_rejected() {
    let a = assignments(Uuid::new_v4());
    let other = assignments(Uuid::new_v4());
    let s = submission(vec![
      answer(&a[0], "x"),
      answer(&a[1], "y"),
      answer(&other[2], "z"),
    ]);
    assert!(s.validate_against(&a).is_err());
  }

  #[test]
  fn duplicate_answer_is_rejected() {
    let a = assignments(Uuid::new_v4());
    let s = submission(vec![
      answer(&a[0], "x"),
      answer(&a[0], "again"),
      answer(&a[1], "y"),
    ]);
    assert!(s.validate_against(&a).is_err());
  }

  #[test]
  fn canonical_answers_take_metadata_from_the_plan() {
    let a = assignments(Uuid::new_v4());
    let forged = |assignment: &Assignment, text: &str| SubmissionAnswer {
      assignment_id: assignment.assignment_id,
      question_text: "forged".into(),
      answer_text:   text.into(),
      is_required:   false,
    };
    let s = submission(vec![forged(&a[2], "c"), forged(&a[1], "b"), forged(&a[0], "a")]);
    s.validate_against(&a).unwrap();

    let stored = s.canonical_answers(&a);
    assert_eq!(stored, vec![answer(&a[0], "a"), answer(&a[1], "b"), answer(&a[2], "c")]);
  }

  #[test]
  fn blank_reflection_normalises_to_none() {
    let mut s = submission(vec![]);
    s.reflection = Some("  \n".into());
    assert_eq!(s.normalized_reflection(), None);
    s.reflection = Some(" learned a lot ".into());
    assert_eq!(s.normalized_reflection().as_deref(), Some("learned a lot"));
  }
}
