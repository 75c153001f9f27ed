//! Identifier decoding.
//!
//! Pipeline:
//!   identifier &str
//!     └─ match_shape()          → Fields (raw captures)
//!          └─ resolve_birth_date() → NaiveDate, overflow flag
//!               └─ age_on()          → DecodedIdentity

use chrono::{Datelike, Duration, NaiveDate};
use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::{
  error::{Error, Result},
  identity::{
    DecodedIdentity, Gender, IdentifierFormat, VoteEligibility, age_on,
  },
};

/// Raw day-of-year values above this mark a female holder.
pub const FEMALE_OFFSET: u16 = 500;

/// Old-format numbers only carry two year digits; they are read as 19xx.
pub const OLD_FORMAT_CENTURY: i32 = 1900;

lazy_static! {
  static ref OLD_NIC_REGEX: Regex =
    Regex::new(r"^([0-9]{2})([0-9]{3})([0-9]{3})([0-9])([VXvx])$").unwrap();
  static ref NEW_NIC_REGEX: Regex =
    Regex::new(r"^([0-9]{4})([0-9]{3})([0-9]{4})([0-9])$").unwrap();
}

// ─── Raw captures ────────────────────────────────────────────────────────────

struct Fields<'a> {
  format:      IdentifierFormat,
  birth_year:  i32,
  day_of_year: u16,
  serial:      &'a str,
  check_digit: u8,
  letter:      Option<char>,
}

fn group<'a>(caps: &Captures<'a>, i: usize) -> &'a str {
  caps.get(i).map_or("", |m| m.as_str())
}

// Every group is an all-digit run of at most four characters, so the numeric
// parses below cannot overflow; `unwrap_or_default` only guards the types.
fn match_shape(identifier: &str) -> Result<Fields<'_>> {
  if let Some(caps) = OLD_NIC_REGEX.captures(identifier) {
    let prefix: i32 = group(&caps, 1).parse().unwrap_or_default();
    return Ok(Fields {
      format:      IdentifierFormat::Old,
      birth_year:  OLD_FORMAT_CENTURY + prefix,
      day_of_year: group(&caps, 2).parse().unwrap_or_default(),
      serial:      group(&caps, 3),
      check_digit: group(&caps, 4).parse().unwrap_or_default(),
      letter:      group(&caps, 5).chars().next(),
    });
  }

  if let Some(caps) = NEW_NIC_REGEX.captures(identifier) {
    return Ok(Fields {
      format:      IdentifierFormat::New,
      birth_year:  group(&caps, 1).parse().unwrap_or_default(),
      day_of_year: group(&caps, 2).parse().unwrap_or_default(),
      serial:      group(&caps, 3),
      check_digit: group(&caps, 4).parse().unwrap_or_default(),
      letter:      None,
    });
  }

  Err(Error::InvalidFormat(identifier.to_string()))
}

// ─── Gender & calendar ───────────────────────────────────────────────────────

/// Split a raw day-of-year into gender and the day-of-year proper.
pub fn split_gender(day_of_year: u16) -> (Gender, u16) {
  if day_of_year > FEMALE_OFFSET {
    (Gender::Female, day_of_year - FEMALE_OFFSET)
  } else {
    (Gender::Male, day_of_year)
  }
}

/// January 1 of `year` advanced by `adjusted_day - 1` days.
///
/// Out-of-range values roll: 366 in a common year lands on January 1 of the
/// next year, and 0 lands on December 31 of the previous one. The flag is set
/// whenever the result leaves `year`. Returns `None` only past the limits of
/// the calendar type.
pub fn resolve_birth_date(
  year: i32,
  adjusted_day: u16,
) -> Option<(NaiveDate, bool)> {
  let start = NaiveDate::from_ymd_opt(year, 1, 1)?;
  let date =
    start.checked_add_signed(Duration::days(i64::from(adjusted_day) - 1))?;
  Some((date, date.year() != year))
}

// ─── Public API ──────────────────────────────────────────────────────────────

/// Decode one identifier against the reference date `as_of`.
///
/// The only failure is [`Error::InvalidFormat`]: the function never partially
/// succeeds.
pub fn decode_identifier(
  identifier: &str,
  as_of: NaiveDate,
) -> Result<DecodedIdentity> {
  let fields = match_shape(identifier)?;
  let (gender, adjusted) = split_gender(fields.day_of_year);
  let (birth_date, calendar_overflow) =
    resolve_birth_date(fields.birth_year, adjusted)
      .ok_or_else(|| Error::InvalidFormat(identifier.to_string()))?;

  let birth_month = birth_date.month();
  let birth_day = birth_date.day();

  Ok(DecodedIdentity {
    nic: identifier.to_string(),
    format: fields.format,
    birth_year: fields.birth_year,
    day_of_year: fields.day_of_year,
    gender,
    birth_month,
    birth_day,
    birth_date,
    calendar_overflow,
    serial_number: fields.serial.to_string(),
    check_digit: fields.check_digit,
    vote_eligibility: fields.letter.and_then(VoteEligibility::from_letter),
    as_of,
    age: age_on(fields.birth_year, birth_month, birth_day, as_of),
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn as_of() -> NaiveDate { date(2024, 6, 1) }

  #[test]
  fn old_format_male_eligible() {
    let id = decode_identifier("891234567V", as_of()).unwrap();
    assert_eq!(id.format, IdentifierFormat::Old);
    assert_eq!(id.birth_year, 1989);
    assert_eq!(id.day_of_year, 123);
    assert_eq!(id.gender, Gender::Male);
    // 1989: Jan 31 + Feb 28 + Mar 31 + Apr 30 = 120, so day 123 is May 3.
    assert_eq!((id.birth_month, id.birth_day), (5, 3));
    assert_eq!(id.serial_number, "456");
    assert_eq!(id.check_digit, 7);
    assert_eq!(id.vote_eligibility, Some(VoteEligibility::Eligible));
    assert!(!id.calendar_overflow);
    assert_eq!(id.age, 35);
  }

  #[test]
  fn old_format_lowercase_x_not_applicable() {
    let id = decode_identifier("891234567x", as_of()).unwrap();
    assert_eq!(id.vote_eligibility, Some(VoteEligibility::NotApplicable));
    assert_eq!(id.nic, "891234567x");
  }

  #[test]
  fn new_format_has_no_eligibility() {
    let id = decode_identifier("200012345678", as_of()).unwrap();
    assert_eq!(id.format, IdentifierFormat::New);
    assert_eq!(id.birth_year, 2000);
    assert_eq!(id.day_of_year, 123);
    // 2000 is a leap year: 31 + 29 + 31 + 30 = 121, so day 123 is May 2.
    assert_eq!((id.birth_month, id.birth_day), (5, 2));
    assert_eq!(id.serial_number, "4567");
    assert_eq!(id.check_digit, 8);
    assert_eq!(id.vote_eligibility, None);
  }

  #[test]
  fn serial_keeps_leading_zeros() {
    let id = decode_identifier("200012300071", as_of()).unwrap();
    assert_eq!(id.serial_number, "0007");
    let id = decode_identifier("850010019V", as_of()).unwrap();
    assert_eq!(id.serial_number, "001");
  }

  #[test]
  fn gender_boundary_at_500() {
    // Raw 500 stays male; in a leap year day 500 overflows into the next year.
    let male = decode_identifier("885001234V", as_of()).unwrap();
    assert_eq!(male.gender, Gender::Male);
    assert_eq!(male.adjusted_day_of_year(), 500);
    assert!(male.calendar_overflow);

    let female = decode_identifier("885011234V", as_of()).unwrap();
    assert_eq!(female.gender, Gender::Female);
    assert_eq!(female.adjusted_day_of_year(), 1);
    assert_eq!((female.birth_month, female.birth_day), (1, 1));
    assert!(!female.calendar_overflow);
  }

  #[test]
  fn female_offset_applies_to_new_format() {
    let id = decode_identifier("199562312345", as_of()).unwrap();
    assert_eq!(id.gender, Gender::Female);
    assert_eq!(id.adjusted_day_of_year(), 123);
    assert_eq!((id.birth_month, id.birth_day), (5, 3));
  }

  #[test]
  fn leap_day() {
    let id = decode_identifier("200006012345", as_of()).unwrap();
    assert_eq!((id.birth_month, id.birth_day), (2, 29));
  }

  #[test]
  fn overflow_rolls_into_next_year_and_is_flagged() {
    // 1989 has 365 days; raw 999 is female day 499.
    let id = decode_identifier("899991234V", as_of()).unwrap();
    assert_eq!(id.gender, Gender::Female);
    assert_eq!(id.adjusted_day_of_year(), 499);
    assert!(id.calendar_overflow);
    // Day 366 is 1990-01-01, so day 499 is 133 days later: 1990-05-14.
    assert_eq!(id.birth_date, date(1990, 5, 14));
    assert_eq!((id.birth_month, id.birth_day), (5, 14));
    assert_eq!(id.birth_year, 1989);
  }

  #[test]
  fn day_366_in_common_year_is_next_january_first() {
    let id = decode_identifier("893661234V", as_of()).unwrap();
    assert_eq!(id.birth_date, date(1990, 1, 1));
    assert!(id.calendar_overflow);

    let leap = decode_identifier("883661234V", as_of()).unwrap();
    assert_eq!(leap.birth_date, date(1988, 12, 31));
    assert!(!leap.calendar_overflow);
  }

  #[test]
  fn day_zero_rolls_back() {
    let id = decode_identifier("890001234V", as_of()).unwrap();
    assert_eq!(id.birth_date, date(1988, 12, 31));
    assert!(id.calendar_overflow);
  }

  #[test]
  fn invalid_format() {
    for bad in [
      "notanic",
      "",
      "891234567",
      "891234567A",
      "8912345678V",
      "20001234567",
      "2000123456789",
      " 891234567V",
      "200012345678V",
    ] {
      assert_eq!(
        decode_identifier(bad, as_of()),
        Err(Error::InvalidFormat(bad.to_string())),
        "{bad:?} should be rejected"
      );
    }
  }

  #[test]
  fn decoding_is_deterministic() {
    let a = decode_identifier("891234567V", as_of()).unwrap();
    let b = decode_identifier("891234567V", as_of()).unwrap();
    assert_eq!(a, b);
  }

  #[test]
  fn no_decrement_on_exact_birthday() {
    let id = decode_identifier("891234567V", date(2024, 5, 3)).unwrap();
    assert_eq!(id.age, 2024 - 1989);
    let id = decode_identifier("891234567V", date(2024, 5, 2)).unwrap();
    assert_eq!(id.age, 2024 - 1989 - 1);
  }

  #[test]
  fn reassess_recomputes_age_only() {
    let id = decode_identifier("891234567V", as_of()).unwrap();
    let later = id.reassess(date(2030, 1, 1));
    assert_eq!(later.age, 40);
    assert_eq!(later.as_of, date(2030, 1, 1));
    assert_eq!(later.birth_date, id.birth_date);
  }
}
