//! Validation records: what the application keeps about each identifier it
//! has seen.
//!
//! A record holds bookkeeping (first/last seen, duplicate count) plus the
//! outcome of validation. The decoded identity is never stored; it is derived
//! again on read so that the age always reflects the caller's reference date.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{
  batch::{BatchEntry, Outcome},
  decode::decode_identifier,
  identity::{DecodedIdentity, VoteEligibility},
  validation::IpInfo,
};

// ─── Classification ──────────────────────────────────────────────────────────

/// Whether an identifier passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ValidationStatus {
  Valid,
  Invalid { reason: String },
}

impl ValidationStatus {
  pub fn is_valid(&self) -> bool { matches!(self, Self::Valid) }

  /// The table a record with this status belongs in.
  pub fn table(&self) -> RecordTable {
    match self {
      Self::Valid => RecordTable::Validated,
      Self::Invalid { .. } => RecordTable::Invalid,
    }
  }
}

/// The two collections records are kept in.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecordTable {
  #[serde(alias = "valid")]
  #[strum(to_string = "validated_nics", serialize = "valid")]
  Validated,
  #[strum(to_string = "invalid_nics", serialize = "invalid")]
  Invalid,
}

/// How the identifier reached the application.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
  Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ValidationKind {
  /// Typed into the single-number validator.
  #[default]
  Single,
  /// Found in an uploaded file.
  Bulk,
}

// ─── NewRecord ───────────────────────────────────────────────────────────────

/// Input to [`crate::store::RecordStore::record`]. Timestamps and the
/// duplicate count are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
  pub nic:                  String,
  pub status:               ValidationStatus,
  #[serde(default)]
  pub kind:                 ValidationKind,
  /// Eligibility reported by the external validation service, used only when
  /// the identifier itself carries none.
  #[serde(default)]
  pub reported_eligibility: Option<VoteEligibility>,
  #[serde(default)]
  pub location:             Option<IpInfo>,
}

impl NewRecord {
  /// Classify `nic` by decoding it locally.
  pub fn classify(nic: &str, kind: ValidationKind, as_of: NaiveDate) -> Self {
    let status = match decode_identifier(nic, as_of) {
      Ok(_) => ValidationStatus::Valid,
      Err(e) => ValidationStatus::Invalid {
        reason: e.to_string(),
      },
    };
    Self {
      nic: nic.to_string(),
      status,
      kind,
      reported_eligibility: None,
      location: None,
    }
  }

  /// A record for one batch entry, keeping the batch's verdict.
  pub fn from_entry(entry: &BatchEntry, kind: ValidationKind) -> Self {
    let status = match &entry.outcome {
      Outcome::Decoded(_) => ValidationStatus::Valid,
      Outcome::Invalid { reason } => ValidationStatus::Invalid {
        reason: reason.clone(),
      },
    };
    Self {
      nic: entry.raw.clone(),
      status,
      kind,
      reported_eligibility: None,
      location: None,
    }
  }

  /// The key a record is stored under: the identifier with its letter
  /// upper-cased.
  pub fn key(&self) -> String { record_key(&self.nic) }
}

/// Storage key for an identifier.
pub fn record_key(nic: &str) -> String { nic.trim().to_ascii_uppercase() }

// ─── ValidationRecord ────────────────────────────────────────────────────────

/// A stored record with its identity derived for a reference date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRecord {
  pub nic:              String,
  pub status:           ValidationStatus,
  pub kind:             ValidationKind,
  /// `None` when the identifier does not decode.
  pub identity:         Option<DecodedIdentity>,
  /// The decoder's eligibility when the identifier carries one, otherwise the
  /// externally reported value.
  pub vote_eligibility: Option<VoteEligibility>,
  pub location:         Option<IpInfo>,
  pub first_seen:       DateTime<Utc>,
  pub last_seen:        DateTime<Utc>,
  /// Sightings after the first one.
  pub duplicate_count:  u32,
}

/// The stored part of a record; everything except the derived identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
  pub nic:                  String,
  pub status:               ValidationStatus,
  pub kind:                 ValidationKind,
  pub reported_eligibility: Option<VoteEligibility>,
  pub location:             Option<IpInfo>,
  pub first_seen:           DateTime<Utc>,
  pub last_seen:            DateTime<Utc>,
  pub duplicate_count:      u32,
}

impl StoredRecord {
  /// Derive the identity for `as_of` and resolve eligibility.
  pub fn materialize(self, as_of: NaiveDate) -> ValidationRecord {
    let identity = decode_identifier(&self.nic, as_of).ok();
    let vote_eligibility = identity
      .as_ref()
      .and_then(|id| id.vote_eligibility)
      .or(self.reported_eligibility);

    ValidationRecord {
      nic: self.nic,
      status: self.status,
      kind: self.kind,
      identity,
      vote_eligibility,
      location: self.location,
      first_seen: self.first_seen,
      last_seen: self.last_seen,
      duplicate_count: self.duplicate_count,
    }
  }
}

// ─── Uploads ─────────────────────────────────────────────────────────────────

/// A file submitted for bulk validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
  pub file_id:       Uuid,
  pub name:          String,
  pub first_created: DateTime<Utc>,
  /// Identifiers found in the file, in order.
  pub nics:          Vec<String>,
}
