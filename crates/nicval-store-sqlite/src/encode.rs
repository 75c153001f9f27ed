//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 with nanosecond precision and a `Z` suffix, so
//! lexical order in SQL matches chronological order. Locations and upload
//! identifier lists are compact JSON.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use nicval_core::{
  VoteEligibility,
  record::{
    RecordTable, StoredRecord, UploadedFile, ValidationKind, ValidationStatus,
  },
  validation::IpInfo,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enumerations ─────────────────────────────────────────────────────────────

fn decode_enum<T: FromStr>(column: &'static str, s: &str) -> Result<T> {
  s.parse().map_err(|_| Error::UnknownValue {
    column,
    value: s.to_string(),
  })
}

pub fn encode_eligibility(e: Option<VoteEligibility>) -> Option<String> {
  e.map(|e| e.as_ref().to_owned())
}

// ─── JSON columns ─────────────────────────────────────────────────────────────

pub fn encode_location(location: Option<&IpInfo>) -> Result<Option<String>> {
  Ok(location.map(serde_json::to_string).transpose()?)
}

pub fn encode_nics(nics: &[String]) -> Result<String> {
  Ok(serde_json::to_string(nics)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read from either record table, plus the table they came from.
pub struct RawRecord {
  pub table:                String,
  pub nic:                  String,
  pub kind:                 String,
  pub reason:               Option<String>,
  pub reported_eligibility: Option<String>,
  pub location_json:        Option<String>,
  pub first_seen:           String,
  pub last_seen:            String,
  pub duplicate_count:      i64,
}

/// Column list matching [`RawRecord::from_row`].
pub const RECORD_COLUMNS: &str = "nic, kind, reason, reported_eligibility, \
                                  location_json, first_seen, last_seen, \
                                  duplicate_count";

impl RawRecord {
  /// Read a row selected as `'<table>', RECORD_COLUMNS`.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      table:                row.get(0)?,
      nic:                  row.get(1)?,
      kind:                 row.get(2)?,
      reason:               row.get(3)?,
      reported_eligibility: row.get(4)?,
      location_json:        row.get(5)?,
      first_seen:           row.get(6)?,
      last_seen:            row.get(7)?,
      duplicate_count:      row.get(8)?,
    })
  }

  pub fn into_stored(self) -> Result<StoredRecord> {
    let status = match decode_enum::<RecordTable>("table", &self.table)? {
      RecordTable::Validated => ValidationStatus::Valid,
      RecordTable::Invalid => ValidationStatus::Invalid {
        reason: self.reason.unwrap_or_default(),
      },
    };

    let location = self
      .location_json
      .as_deref()
      .map(serde_json::from_str)
      .transpose()?;

    let reported_eligibility = self
      .reported_eligibility
      .as_deref()
      .map(|e| decode_enum("reported_eligibility", e))
      .transpose()?;

    Ok(StoredRecord {
      nic: self.nic,
      status,
      kind: decode_enum::<ValidationKind>("kind", &self.kind)?,
      reported_eligibility,
      location,
      first_seen: decode_dt(&self.first_seen)?,
      last_seen: decode_dt(&self.last_seen)?,
      duplicate_count: u32::try_from(self.duplicate_count).map_err(|_| {
        Error::UnknownValue {
          column: "duplicate_count",
          value:  self.duplicate_count.to_string(),
        }
      })?,
    })
  }
}

/// Raw values read from an `uploaded_files` row.
pub struct RawUpload {
  pub file_id:       String,
  pub name:          String,
  pub first_created: String,
  pub nics_json:     String,
}

impl RawUpload {
  pub fn into_upload(self) -> Result<UploadedFile> {
    Ok(UploadedFile {
      file_id:       decode_uuid(&self.file_id)?,
      name:          self.name,
      first_created: decode_dt(&self.first_created)?,
      nics:          serde_json::from_str(&self.nics_json)?,
    })
  }
}
