//! Invite codes: 8 characters from `[A-Z0-9]`.
//!
//! Uniqueness is enforced by the store's unique constraint, not by probing
//! before insert.

use std::fmt;

use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const INVITE_CODE_LEN: usize = 8;
const ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
// Largest multiple of 36 that fits in a byte; bytes at or above it are
// rejected so every symbol is equally likely.
const REJECT_FROM: u8 = 252;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InviteCode(String);

impl InviteCode {
  /// Draw a fresh code from the OS RNG.
  pub fn generate() -> Self { Self::generate_with(&mut OsRng) }

  pub fn generate_with(rng: &mut impl RngCore) -> Self {
    let mut code = String::with_capacity(INVITE_CODE_LEN);
    let mut buf = [0u8; 16];
    while code.len() < INVITE_CODE_LEN {
      rng.fill_bytes(&mut buf);
      for b in buf {
        if b < REJECT_FROM && code.len() < INVITE_CODE_LEN {
          code.push(ALPHABET[usize::from(b % 36)] as char);
        }
      }
    }
    Self(code)
  }

  /// Normalise user input (trim, upper-case) and check the shape.
  pub fn parse(input: &str) -> Result<Self> {
    let code = input.trim().to_ascii_uppercase();
    if code.len() != INVITE_CODE_LEN
      || !code.bytes().all(|b| ALPHABET.contains(&b))
    {
      return Err(Error::invalid(format!(
        "invite code must be {INVITE_CODE_LEN} letters or digits"
      )));
    }
    Ok(Self(code))
  }

  /// Wrap a code read back from storage without re-validating it.
  pub fn from_stored(code: String) -> Self { Self(code) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for InviteCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashSet;

  use super::*;

  #[test]
  fn generated_codes_have_the_right_shape() {
    for _ in 0..200 {
      let code = InviteCode::generate();
      assert_eq!(code.as_str().len(), INVITE_CODE_LEN);
      assert!(
        code
          .as_str()
          .bytes()
          .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()),
        "unexpected symbol in {code}"
      );
    }
  }

  #[test]
  fn generated_codes_do_not_repeat_in_practice() {
    let codes: HashSet<_> = (0..500).map(|_| InviteCode::generate()).collect();
    assert_eq!(codes.len(), 500);
  }

  #[test]
  fn parse_normalises_case_and_whitespace() {
    let code = InviteCode::parse("  ab12cd34 \n").unwrap();
    assert_eq!(code.as_str(), "AB12CD34");
  }

  #[test]
  fn parse_rejects_wrong_length_and_symbols() {
    assert!(InviteCode::parse("ABC").is_err());
    assert!(InviteCode::parse("ABCD-123").is_err());
    assert!(InviteCode::parse("ABCDEFGHI").is_err());
  }
}
