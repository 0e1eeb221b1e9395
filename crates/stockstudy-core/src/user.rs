//! User accounts.
//!
//! Passwords are stored as argon2 PHC strings and never leave the process:
//! `password_hash` is skipped when a [`User`] is serialised.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use chrono::{DateTime, Utc};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 50;
pub const PASSWORD_MIN_LEN: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub user_id:       Uuid,
  pub username:      String,
  pub email:         String,
  #[serde(skip_serializing, default)]
  pub password_hash: String,
  pub photo_url:     Option<String>,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
  pub last_login_at: Option<DateTime<Utc>>,
}

/// Input to [`crate::service::StudyService::register_user`].
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
  pub username:  String,
  pub email:     String,
  pub password:  String,
  #[serde(default)]
  pub photo_url: Option<String>,
}

impl Registration {
  /// Trim the email and fold it to lower case so lookups and uniqueness
  /// ignore case.
  pub fn normalized(mut self) -> Self {
    self.email = normalize_email(&self.email);
    self
  }

  /// Check username, email and password shape. Uniqueness is checked against
  /// the store by the service.
  pub fn validate(&self) -> Result<()> {
    let username = self.username.as_str();
    if username.len() < USERNAME_MIN_LEN || username.len() > USERNAME_MAX_LEN {
      return Err(Error::invalid(format!(
        "username must be between {USERNAME_MIN_LEN} and {USERNAME_MAX_LEN} characters"
      )));
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
      return Err(Error::invalid(
        "username can only contain letters, numbers, and underscores",
      ));
    }
    if !is_plausible_email(&self.email) {
      return Err(Error::invalid("invalid email format"));
    }
    if self.password.chars().count() < PASSWORD_MIN_LEN {
      return Err(Error::invalid(format!(
        "password must be at least {PASSWORD_MIN_LEN} characters long"
      )));
    }
    Ok(())
  }
}

pub fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }

/// `local@domain.tld`, no whitespace, exactly one `@`.
fn is_plausible_email(email: &str) -> bool {
  if email.chars().any(char::is_whitespace) {
    return false;
  }
  let Some((local, domain)) = email.split_once('@') else {
    return false;
  };
  if local.is_empty() || domain.contains('@') {
    return false;
  }
  match domain.rsplit_once('.') {
    Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
    None => false,
  }
}

// ─── Passwords ───────────────────────────────────────────────────────────────

pub fn hash_password(password: &str) -> Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| Error::PasswordHash(e.to_string()))
}

/// `false` for a wrong password or an unparseable stored hash.
pub fn verify_password(password: &str, phc: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(phc) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn registration(username: &str, email: &str, password: &str) -> Registration {
    Registration {
      username:  username.into(),
      email:     email.into(),
      password:  password.into(),
      photo_url: None,
    }
  }

  #[test]
  fn accepts_well_formed_registration() {
    registration("alice_01", "alice@example.com", "hunter2hunter2")
      .validate()
      .unwrap();
  }

  #[test]
  fn email_is_trimmed_and_lowercased() {
    let r = registration("alice_01", "  Alice@Example.COM ", "hunter2hunter2")
      .normalized();
    assert_eq!(r.email, "alice@example.com");
    r.validate().unwrap();
  }

  #[test]
  fn rejects_short_or_symbolic_usernames() {
    assert!(matches!(
      registration("al", "alice@example.com", "longenough").validate(),
      Err(Error::Validation(_))
    ));
    assert!(matches!(
      registration("alice!", "alice@example.com", "longenough").validate(),
      Err(Error::Validation(_))
    ));
  }

  #[test]
  fn rejects_malformed_email() {
    for email in ["alice", "alice@", "@example.com", "alice@example", "a b@c.d"] {
      assert!(
        registration("alice", email, "longenough").validate().is_err(),
        "{email} should be rejected"
      );
    }
  }

  #[test]
  fn rejects_short_password() {
    assert!(registration("alice", "alice@example.com", "short").validate().is_err());
  }

  #[test]
  fn password_hash_verifies() {
    let phc = hash_password("correct horse").unwrap();
    assert!(phc.starts_with("$argon2"));
    assert!(verify_password("correct horse", &phc));
    assert!(!verify_password("wrong horse", &phc));
    assert!(!verify_password("correct horse", "not-a-phc-string"));
  }
}
