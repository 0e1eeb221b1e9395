//! Completion rate for a member's 15-day programme.

use crate::curriculum::TOTAL_DAYS;

/// `round(100 × completed / 15)`, halves rounding up, capped at 100.
pub fn progress_rate(completed: u32) -> u8 {
  let total = u32::from(TOTAL_DAYS);
  let completed = completed.min(total);
  ((completed * 100 + total / 2) / total) as u8
}
