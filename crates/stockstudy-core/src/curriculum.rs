//! The fixed 15-day curriculum every study is seeded with.
//!
//! Day plans and their assignments are generated once, at study creation, and
//! never change afterwards.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Length of every study programme. Progress is measured against this
/// constant, not against the number of stored day plans.
pub const TOTAL_DAYS: u8 = 15;

pub const ASSIGNMENTS_PER_DAY: u8 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayPlan {
  pub plan_id:       Uuid,
  pub study_id:      Uuid,
  /// 1–15, unique per study.
  pub day_number:    u8,
  pub title:         String,
  pub learning_goal: String,
  pub chapter_info:  String,
  pub description:   String,
  pub target_date:   NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
  pub assignment_id:  Uuid,
  pub plan_id:        Uuid,
  pub question_text:  String,
  /// 1–3 within a plan.
  pub question_order: u8,
  pub is_required:    bool,
}

/// A day plan bundled with its assignments, as inserted at study creation.
#[derive(Debug, Clone)]
pub struct SeededDay {
  pub plan:        DayPlan,
  pub assignments: Vec<Assignment>,
}

// ─── Templates ───────────────────────────────────────────────────────────────

struct DayTemplate {
  title:         &'static str,
  learning_goal: &'static str,
}

const DAYS: [DayTemplate; TOTAL_DAYS as usize] = [
  DayTemplate {
    title:         "Introduction to Stock Market",
    learning_goal: "Understand the basic concepts of stock market and investing",
  },
  DayTemplate {
    title:         "Types of Stocks",
    learning_goal: "Learn about different types of stocks and their characteristics",
  },
  DayTemplate {
    title:         "Reading Stock Charts",
    learning_goal: "Master the basics of reading and interpreting stock charts",
  },
  DayTemplate {
    title:         "Market Analysis Fundamentals",
    learning_goal: "Learn fundamental analysis techniques",
  },
  DayTemplate {
    title:         "Financial Statements Analysis",
    learning_goal: "Understand balance sheets, income statements, and cash flow",
  },
  DayTemplate {
    title:         "Technical Indicators",
    learning_goal: "Learn about key technical indicators and their usage",
  },
  DayTemplate {
    title:         "Risk Management",
    learning_goal: "Understand risk management strategies in stock investing",
  },
  DayTemplate {
    title:         "Portfolio Diversification",
    learning_goal: "Learn how to build a diversified investment portfolio",
  },
  DayTemplate {
    title:         "Market Trends and Cycles",
    learning_goal: "Understand market cycles and trend analysis",
  },
  DayTemplate {
    title:         "Investment Strategies",
    learning_goal: "Explore different investment strategies and when to use them",
  },
  DayTemplate {
    title:         "Trading Psychology",
    learning_goal: "Learn about emotional control and trading discipline",
  },
  DayTemplate {
    title:         "Value Investing",
    learning_goal: "Understand value investing principles and techniques",
  },
  DayTemplate {
    title:         "Growth Investing",
    learning_goal: "Learn about growth stock identification and analysis",
  },
  DayTemplate {
    title:         "Market News and Information",
    learning_goal: "Learn how to interpret market news and use information effectively",
  },
  DayTemplate {
    title:         "Building Your Investment Plan",
    learning_goal: "Create a personalized investment plan and strategy",
  },
];

const QUESTIONS: [(&str, bool); ASSIGNMENTS_PER_DAY as usize] = [
  ("What are the key concepts you learned today?", true),
  ("How can you apply today's learning to your investment strategy?", true),
  ("What questions or uncertainties do you still have?", false),
];

/// Build the full curriculum for a study starting on `start_date`.
///
/// Day N targets `start_date + (N - 1)` days.
pub fn seed(study_id: Uuid, start_date: NaiveDate) -> Vec<SeededDay> {
  DAYS
    .iter()
    .zip(1..=TOTAL_DAYS)
    .map(|(day, day_number)| {
      let plan_id = Uuid::new_v4();
      let target_date = start_date
        .checked_add_days(Days::new(u64::from(day_number - 1)))
        .unwrap_or(start_date);

      let plan = DayPlan {
        plan_id,
        study_id,
        day_number,
        title: day.title.to_owned(),
        learning_goal: day.learning_goal.to_owned(),
        chapter_info: format!("Chapter {day_number}"),
        description: format!("Day {day_number}: {}", day.title),
        target_date,
      };

      let assignments = QUESTIONS
        .iter()
        .zip(1..=ASSIGNMENTS_PER_DAY)
        .map(|(&(text, is_required), question_order)| Assignment {
          assignment_id: Uuid::new_v4(),
          plan_id,
          question_text: text.to_owned(),
          question_order,
          is_required,
        })
        .collect();

      SeededDay { plan, assignments }
    })
    .collect()
}

/// Which day of the programme `today` falls on, clamped to 1–15.
pub fn current_day_number(start_date: NaiveDate, today: NaiveDate) -> u8 {
  let elapsed = (today - start_date).num_days() + 1;
  elapsed.clamp(1, i64::from(TOTAL_DAYS)) as u8
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeSet;

  use super::*;

  fn start() -> NaiveDate { NaiveDate::from_ymd_opt(2026, 1, 30).unwrap() }

  #[test]
  fn seeds_fifteen_days_with_three_assignments_each() {
    let study_id = Uuid::new_v4();
    let days = seed(study_id, start());

    assert_eq!(days.len(), 15);
    let numbers: BTreeSet<u8> = days.iter().map(|d| d.plan.day_number).collect();
    assert_eq!(numbers, (1..=15).collect());

    for day in &days {
      assert_eq!(day.plan.study_id, study_id);
      let orders: Vec<u8> =
        day.assignments.iter().map(|a| a.question_order).collect();
      assert_eq!(orders, [1, 2, 3]);
      assert!(day.assignments.iter().all(|a| a.plan_id == day.plan.plan_id));
    }
    let total: usize = days.iter().map(|d| d.assignments.len()).sum();
    assert_eq!(total, 45);
  }

  #[test]
  fn only_the_third_question_is_optional() {
    let days = seed(Uuid::new_v4(), start());
    let required: Vec<bool> =
      days[4].assignments.iter().map(|a| a.is_required).collect();
    assert_eq!(required, [true, true, false]);
  }

  #[test]
  fn target_dates_advance_one_day_at_a_time() {
    let days = seed(Uuid::new_v4(), start());
    assert_eq!(days[0].plan.target_date, start());
    assert_eq!(
      days[14].plan.target_date,
      NaiveDate::from_ymd_opt(2026, 2, 13).unwrap()
    );
  }

  #[test]
  fn plan_text_comes_from_the_template() {
    let days = seed(Uuid::new_v4(), start());
    assert_eq!(days[6].plan.title, "Risk Management");
    assert_eq!(days[6].plan.chapter_info, "Chapter 7");
    assert_eq!(days[6].plan.description, "Day 7: Risk Management");
  }

  #[test]
  fn current_day_is_clamped() {
    let s = start();
    assert_eq!(current_day_number(s, s - Days::new(10)), 1);
    assert_eq!(current_day_number(s, s), 1);
    assert_eq!(current_day_number(s, s + Days::new(4)), 5);
    assert_eq!(current_day_number(s, s + Days::new(40)), 15);
  }
}
