//! Dashboard aggregates over stored records.

use serde::{Deserialize, Serialize};

use crate::{
  identity::{Gender, VoteEligibility},
  record::ValidationRecord,
};

pub const MONTH_NAMES: [&str; 12] = [
  "January",
  "February",
  "March",
  "April",
  "May",
  "June",
  "July",
  "August",
  "September",
  "October",
  "November",
  "December",
];

/// Share of each gender's births falling in one month, in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthShare {
  pub month:      String,
  pub female:     u32,
  pub male:       u32,
  pub female_pct: f64,
  pub male_pct:   f64,
}

/// One slice of the eligibility breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityShare {
  pub category: String,
  pub count:    u32,
  pub pct:      f64,
}

/// Everything the dashboard shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
  pub total:        usize,
  pub valid:        usize,
  pub invalid:      usize,
  /// Sum of every record's duplicate count.
  pub duplicates:   u64,
  pub birth_months: Vec<MonthShare>,
  pub eligibility:  Vec<EligibilityShare>,
}

fn percent(part: u32, whole: u32) -> f64 {
  if whole == 0 {
    0.0
  } else {
    f64::from(part) / f64::from(whole) * 100.0
  }
}

/// Births per month split by gender, over valid records that decode.
pub fn birth_months_by_gender(records: &[ValidationRecord]) -> Vec<MonthShare> {
  let mut female = [0u32; 12];
  let mut male = [0u32; 12];

  for identity in records
    .iter()
    .filter(|r| r.status.is_valid())
    .filter_map(|r| r.identity.as_ref())
  {
    let index = (identity.birth_month as usize).saturating_sub(1).min(11);
    match identity.gender {
      Gender::Female => female[index] += 1,
      Gender::Male => male[index] += 1,
    }
  }

  let female_total: u32 = female.iter().sum();
  let male_total: u32 = male.iter().sum();

  MONTH_NAMES
    .iter()
    .enumerate()
    .map(|(i, month)| MonthShare {
      month:      (*month).to_string(),
      female:     female[i],
      male:       male[i],
      female_pct: percent(female[i], female_total),
      male_pct:   percent(male[i], male_total),
    })
    .collect()
}

/// Eligible / Ineligible / Unknown counts over valid records.
pub fn eligibility_breakdown(
  records: &[ValidationRecord],
) -> Vec<EligibilityShare> {
  let mut counts = [0u32; 3];
  for record in records.iter().filter(|r| r.status.is_valid()) {
    let slot = match record.vote_eligibility {
      Some(VoteEligibility::Eligible) => 0,
      Some(VoteEligibility::NotApplicable) => 1,
      None => 2,
    };
    counts[slot] += 1;
  }

  let total: u32 = counts.iter().sum();
  ["Eligible", "Ineligible", "Unknown"]
    .iter()
    .zip(counts)
    .map(|(category, count)| EligibilityShare {
      category: (*category).to_string(),
      count,
      pct: percent(count, total),
    })
    .collect()
}

/// Build the full dashboard summary.
pub fn summarize(records: &[ValidationRecord]) -> Summary {
  let valid = records.iter().filter(|r| r.status.is_valid()).count();
  Summary {
    total: records.len(),
    valid,
    invalid: records.len() - valid,
    duplicates: records.iter().map(|r| u64::from(r.duplicate_count)).sum(),
    birth_months: birth_months_by_gender(records),
    eligibility: eligibility_breakdown(records),
  }
}

#[cfg(test)]
mod tests {
  use chrono::{NaiveDate, Utc};

  use super::*;
  use crate::record::{StoredRecord, ValidationKind, ValidationStatus};

  fn record(nic: &str, status: ValidationStatus, duplicates: u32) -> ValidationRecord {
    let now = Utc::now();
    StoredRecord {
      nic: nic.to_string(),
      status,
      kind: ValidationKind::Bulk,
      reported_eligibility: None,
      location: None,
      first_seen: now,
      last_seen: now,
      duplicate_count: duplicates,
    }
    .materialize(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
  }

  fn sample() -> Vec<ValidationRecord> {
    vec![
      // Male, May, eligible.
      record("891234567V", ValidationStatus::Valid, 2),
      // Female, January, not applicable.
      record("885011234X", ValidationStatus::Valid, 0),
      // Female, May, unknown eligibility.
      record("199562312345", ValidationStatus::Valid, 0),
      record(
        "12345",
        ValidationStatus::Invalid {
          reason: "bad".to_string(),
        },
        1,
      ),
    ]
  }

  #[test]
  fn month_shares_are_per_gender() {
    let months = birth_months_by_gender(&sample());
    assert_eq!(months.len(), 12);
    assert_eq!(months[0].month, "January");
    assert_eq!(months[0].female, 1);
    assert_eq!(months[0].female_pct, 50.0);
    assert_eq!(months[4].female, 1);
    assert_eq!(months[4].male, 1);
    assert_eq!(months[4].male_pct, 100.0);
    assert_eq!(months[1].male_pct, 0.0);
  }

  #[test]
  fn eligibility_counts() {
    let shares = eligibility_breakdown(&sample());
    let counts: Vec<_> = shares.iter().map(|s| s.count).collect();
    assert_eq!(counts, vec![1, 1, 1]);
    assert!((shares[0].pct - 100.0 / 3.0).abs() < 1e-9);
  }

  #[test]
  fn summary_totals() {
    let summary = summarize(&sample());
    assert_eq!(summary.total, 4);
    assert_eq!(summary.valid, 3);
    assert_eq!(summary.invalid, 1);
    assert_eq!(summary.duplicates, 3);
  }

  #[test]
  fn empty_summary_has_zero_percentages() {
    let summary = summarize(&[]);
    assert!(summary.birth_months.iter().all(|m| m.female_pct == 0.0));
    assert!(summary.eligibility.iter().all(|e| e.pct == 0.0));
  }
}
