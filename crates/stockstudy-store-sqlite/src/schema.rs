//! SQL schema for the stock-study SQLite store.
//!
//! Executed once at connection startup. Every dependent table cascades from
//! `studies`, so deleting a study removes its whole subtree.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,          -- argon2 PHC string
    photo_url     TEXT,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL,
    last_login_at TEXT
);

CREATE TABLE IF NOT EXISTS studies (
    study_id    TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    description TEXT,
    book_title  TEXT NOT NULL,
    invite_code TEXT NOT NULL UNIQUE,
    start_date  TEXT NOT NULL,            -- YYYY-MM-DD
    end_date    TEXT NOT NULL,
    owner_id    TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    status      TEXT NOT NULL DEFAULT 'active',   -- 'active' | 'completed' | 'archived'
    max_members INTEGER NOT NULL CHECK (max_members BETWEEN 1 AND 50),
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

-- One row per (study, user); leaving clears is_active.
CREATE TABLE IF NOT EXISTS study_members (
    member_id     TEXT PRIMARY KEY,
    study_id      TEXT NOT NULL REFERENCES studies(study_id) ON DELETE CASCADE,
    user_id       TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    role          TEXT NOT NULL,          -- 'owner' | 'member'
    joined_at     TEXT NOT NULL,
    is_active     INTEGER NOT NULL DEFAULT 1,
    progress_rate INTEGER NOT NULL DEFAULT 0 CHECK (progress_rate BETWEEN 0 AND 100),
    UNIQUE (study_id, user_id)
);

CREATE UNIQUE INDEX IF NOT EXISTS study_members_one_owner_idx
    ON study_members(study_id) WHERE role = 'owner';

-- Seeded at study creation, never updated.
CREATE TABLE IF NOT EXISTS day_plans (
    plan_id       TEXT PRIMARY KEY,
    study_id      TEXT NOT NULL REFERENCES studies(study_id) ON DELETE CASCADE,
    day_number    INTEGER NOT NULL CHECK (day_number BETWEEN 1 AND 15),
    title         TEXT NOT NULL,
    learning_goal TEXT NOT NULL,
    chapter_info  TEXT NOT NULL,
    description   TEXT NOT NULL,
    target_date   TEXT NOT NULL,
    UNIQUE (study_id, day_number)
);

CREATE TABLE IF NOT EXISTS assignments (
    assignment_id  TEXT PRIMARY KEY,
    plan_id        TEXT NOT NULL REFERENCES day_plans(plan_id) ON DELETE CASCADE,
    question_text  TEXT NOT NULL,
    question_order INTEGER NOT NULL CHECK (question_order BETWEEN 1 AND 3),
    is_required    INTEGER NOT NULL DEFAULT 1,
    UNIQUE (plan_id, question_order)
);

CREATE TABLE IF NOT EXISTS submissions (
    submission_id TEXT PRIMARY KEY,
    plan_id       TEXT NOT NULL REFERENCES day_plans(plan_id) ON DELETE CASCADE,
    study_id      TEXT NOT NULL REFERENCES studies(study_id) ON DELETE CASCADE,
    user_id       TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    day_number    INTEGER NOT NULL,
    answers_json  TEXT NOT NULL,          -- JSON array of SubmissionAnswer
    reflection    TEXT,
    is_completed  INTEGER NOT NULL DEFAULT 0,
    submitted_at  TEXT,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL,
    UNIQUE (plan_id, user_id)
);

-- Deleting a comment sets is_deleted; rows are never removed individually.
CREATE TABLE IF NOT EXISTS comments (
    comment_id    TEXT PRIMARY KEY,
    submission_id TEXT NOT NULL REFERENCES submissions(submission_id) ON DELETE CASCADE,
    study_id      TEXT NOT NULL REFERENCES studies(study_id) ON DELETE CASCADE,
    user_id       TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    content       TEXT NOT NULL,
    is_deleted    INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS study_members_user_idx  ON study_members(user_id);
CREATE INDEX IF NOT EXISTS submissions_member_idx  ON submissions(study_id, user_id);
CREATE INDEX IF NOT EXISTS comments_submission_idx ON comments(submission_id);

PRAGMA user_version = 1;
";
