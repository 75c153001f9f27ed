//! Identity types: what a decoded identity-card number says about its holder.
//!
//! A [`DecodedIdentity`] is derived purely from the identifier string and an
//! explicit reference date. It owns no external resources and is never
//! mutated after construction.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::decode::FEMALE_OFFSET;

// ─── Enumerations ────────────────────────────────────────────────────────────

/// Which of the two issued identifier shapes a number uses.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum IdentifierFormat {
  /// Nine digits followed by a `V` or `X` letter.
  Old,
  /// Twelve digits with a four-digit birth year.
  New,
}

/// Gender as encoded by the day-of-year offset.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString, AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Gender {
  Male,
  Female,
}

/// Voting eligibility carried by the trailing letter of an old-format number.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VoteEligibility {
  /// Trailing `V`.
  Eligible,
  /// Trailing `X`.
  NotApplicable,
}

impl VoteEligibility {
  /// Map the trailing letter of an old-format number; `None` for anything
  /// other than `V`/`X` (either case).
  pub fn from_letter(letter: char) -> Option<Self> {
    match letter.to_ascii_uppercase() {
      'V' => Some(Self::Eligible),
      'X' => Some(Self::NotApplicable),
      _ => None,
    }
  }
}

// ─── DecodedIdentity ─────────────────────────────────────────────────────────

/// Everything the digit structure of one identifier reveals.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecodedIdentity {
  /// The identifier exactly as it was decoded (letter case preserved).
  pub nic:               String,
  pub format:            IdentifierFormat,
  /// Encoded birth year. Old-format numbers are always read as 19xx.
  pub birth_year:        i32,
  /// The raw three-digit day-of-year field, before the gender offset.
  pub day_of_year:       u16,
  pub gender:            Gender,
  pub birth_month:       u32,
  pub birth_day:         u32,
  /// January 1 of `birth_year` advanced by the adjusted day-of-year.
  pub birth_date:        NaiveDate,
  /// `true` when the adjusted day-of-year falls outside `birth_year` and the
  /// date rolled into a neighbouring year.
  pub calendar_overflow: bool,
  /// Fixed-width serial run; leading zeros preserved.
  pub serial_number:     String,
  pub check_digit:       u8,
  /// `None` for new-format numbers, which carry no eligibility letter.
  pub vote_eligibility:  Option<VoteEligibility>,
  /// The reference date `age` was computed against.
  pub as_of:             NaiveDate,
  pub age:               i32,
}

impl DecodedIdentity {
  /// Day-of-year after removing the female offset.
  pub fn adjusted_day_of_year(&self) -> u16 {
    match self.gender {
      Gender::Female => self.day_of_year - FEMALE_OFFSET,
      Gender::Male => self.day_of_year,
    }
  }

  /// Age in whole years on `as_of`.
  pub fn age_on(&self, as_of: NaiveDate) -> i32 {
    age_on(self.birth_year, self.birth_month, self.birth_day, as_of)
  }

  /// A copy of this identity with its age recomputed for `as_of`.
  pub fn reassess(&self, as_of: NaiveDate) -> Self {
    Self {
      as_of,
      age: self.age_on(as_of),
      ..self.clone()
    }
  }

  /// The resolved birth date in the `DD/MM/YYYY` form used by exported
  /// reports. After an overflow its year differs from `birth_year`.
  pub fn birth_date_display(&self) -> String {
    self.birth_date.format("%d/%m/%Y").to_string()
  }
}

/// `as_of.year - birth_year`, one less if the birthday has not yet come round
/// in `as_of`'s year. No decrement on the birthday itself.
pub fn age_on(
  birth_year: i32,
  birth_month: u32,
  birth_day: u32,
  as_of: NaiveDate,
) -> i32 {
  let mut age = as_of.year() - birth_year;
  if (as_of.month(), as_of.day()) < (birth_month, birth_day) {
    age -= 1;
  }
  age
}

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  #[test]
  fn age_counts_birthday_itself() {
    assert_eq!(age_on(1989, 5, 3, date(2024, 5, 3)), 35);
  }

  #[test]
  fn age_decrements_before_birthday() {
    assert_eq!(age_on(1989, 5, 3, date(2024, 5, 2)), 34);
    assert_eq!(age_on(1989, 5, 3, date(2024, 4, 30)), 34);
  }

  #[test]
  fn age_after_birthday() {
    assert_eq!(age_on(1989, 5, 3, date(2024, 12, 31)), 35);
  }

  #[test]
  fn eligibility_letter_is_case_insensitive() {
    assert_eq!(VoteEligibility::from_letter('v'), Some(VoteEligibility::Eligible));
    assert_eq!(
      VoteEligibility::from_letter('X'),
      Some(VoteEligibility::NotApplicable)
    );
    assert_eq!(VoteEligibility::from_letter('Z'), None);
  }

  #[test]
  fn display_uses_the_resolved_date() {
    let mut identity = crate::decode::decode_identifier("891234567V", date(2024, 6, 1))
      .unwrap();
    assert_eq!(identity.birth_date_display(), "03/05/1989");

    identity = crate::decode::decode_identifier("899991234V", date(2024, 6, 1)).unwrap();
    assert!(identity.calendar_overflow);
    assert_eq!(identity.birth_date_display(), "14/05/1990");
    assert_eq!(identity.adjusted_day_of_year(), 499);
  }

  #[test]
  fn enum_string_forms() {
    assert_eq!(Gender::Female.to_string(), "Female");
    assert_eq!(Gender::from_str("male").unwrap(), Gender::Male);
    assert_eq!(VoteEligibility::NotApplicable.as_ref(), "not_applicable");
    assert_eq!(IdentifierFormat::from_str("new").unwrap(), IdentifierFormat::New);
  }
}
