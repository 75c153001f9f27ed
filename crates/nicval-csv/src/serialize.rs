//! Report writers.
//!
//! Every column is text so missing values can read `N/A` instead of an empty
//! cell. The header row is written even when there are no rows.

use std::io::Write;

use chrono::{DateTime, SecondsFormat, Utc};
use nicval_core::{
  Batch, DecodedIdentity, VoteEligibility,
  record::{ValidationRecord, ValidationStatus},
};

use crate::error::Result;

const NOT_AVAILABLE: &str = "N/A";

const BATCH_HEADER: [&str; 11] = [
  "#",
  "NIC",
  "Valid",
  "Birth Year",
  "Birth Date",
  "Age",
  "Gender",
  "Voting Eligibility",
  "Serial Number",
  "Check Digit",
  "Calendar Overflow",
];

const RECORD_HEADER: [&str; 14] = [
  "NIC",
  "Status",
  "Reason",
  "Kind",
  "Birth Date",
  "Age",
  "Gender",
  "Voting Eligibility",
  "City",
  "Country",
  "Duplicate Count",
  "First Seen",
  "Last Seen",
  "Calendar Overflow",
];

// ─── Cell helpers ─────────────────────────────────────────────────────────────

fn eligibility_label(eligibility: Option<VoteEligibility>) -> &'static str {
  match eligibility {
    Some(VoteEligibility::Eligible) => "Eligible",
    Some(VoteEligibility::NotApplicable) => "Not Applicable",
    None => "Unknown",
  }
}

fn or_na(value: Option<String>) -> String {
  value.unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn timestamp(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Birth date, age and gender cells, shared by both reports.
fn identity_cells(
  identity: Option<&DecodedIdentity>,
) -> (String, String, String) {
  (
    or_na(identity.map(DecodedIdentity::birth_date_display)),
    or_na(identity.map(|id| format!("{} years", id.age))),
    or_na(identity.map(|id| id.gender.to_string())),
  )
}

// ─── Writers ──────────────────────────────────────────────────────────────────

pub(crate) fn write_batch<W: Write>(writer: W, batch: &Batch) -> Result<()> {
  let mut wtr = csv::Writer::from_writer(writer);
  wtr.write_record(BATCH_HEADER)?;

  for (index, entry) in batch.entries.iter().enumerate() {
    let identity = entry.outcome.identity();
    let (birth_date, age, gender) = identity_cells(identity);
    let eligibility = match identity {
      Some(id) => eligibility_label(id.vote_eligibility).to_string(),
      None => NOT_AVAILABLE.to_string(),
    };

    wtr.write_record([
      (index + 1).to_string(),
      entry.raw.clone(),
      if identity.is_some() { "Valid" } else { "Invalid" }.to_string(),
      or_na(identity.map(|id| id.birth_year.to_string())),
      birth_date,
      age,
      gender,
      eligibility,
      or_na(identity.map(|id| id.serial_number.clone())),
      or_na(identity.map(|id| id.check_digit.to_string())),
      or_na(identity.map(|id| id.calendar_overflow.to_string())),
    ])?;
  }

  wtr.flush()?;
  Ok(())
}

pub(crate) fn write_records<W: Write>(
  writer: W,
  records: &[ValidationRecord],
) -> Result<()> {
  let mut wtr = csv::Writer::from_writer(writer);
  wtr.write_record(RECORD_HEADER)?;

  for record in records {
    let identity = record.identity.as_ref();
    let (birth_date, age, gender) = identity_cells(identity);
    let (status, reason) = match &record.status {
      ValidationStatus::Valid => ("Valid", String::new()),
      ValidationStatus::Invalid { reason } => ("Invalid", reason.clone()),
    };
    let location = record.location.as_ref();

    wtr.write_record([
      record.nic.clone(),
      status.to_string(),
      reason,
      record.kind.to_string(),
      birth_date,
      age,
      gender,
      eligibility_label(record.vote_eligibility).to_string(),
      or_na(location.and_then(|l| l.city.clone())),
      or_na(location.and_then(|l| l.country.clone())),
      record.duplicate_count.to_string(),
      timestamp(record.first_seen),
      timestamp(record.last_seen),
      identity
        .map(|id| id.calendar_overflow)
        .unwrap_or(false)
        .to_string(),
    ])?;
  }

  wtr.flush()?;
  Ok(())
}
