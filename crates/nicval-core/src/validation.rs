//! Typed responses from the external validation and IP-geolocation services.
//!
//! The validation endpoint answers either `{"NIC": {...}, "IP": {...}}` or
//! `{"error": "..."}`. [`ValidationResponse::into_result`] checks which one
//! arrived before any field is read.

use serde::{Deserialize, Deserializer, Serialize};

use crate::{
  error::{Error, Result},
  identity::{DecodedIdentity, Gender, VoteEligibility},
};

// ─── IP geolocation ──────────────────────────────────────────────────────────

/// Caller location as reported by the geolocation service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpInfo {
  #[serde(default)]
  pub ip:       Option<String>,
  #[serde(default)]
  pub city:     Option<String>,
  #[serde(default)]
  pub region:   Option<String>,
  #[serde(default)]
  pub country:  Option<String>,
  /// `"latitude,longitude"`.
  #[serde(default)]
  pub loc:      Option<String>,
  #[serde(default)]
  pub org:      Option<String>,
  #[serde(default)]
  pub timezone: Option<String>,
}

impl IpInfo {
  /// Parse `loc` into `(latitude, longitude)`.
  pub fn coordinates(&self) -> Option<(f64, f64)> {
    let (lat, long) = self.loc.as_deref()?.split_once(',')?;
    Some((lat.trim().parse().ok()?, long.trim().parse().ok()?))
  }
}

// ─── NIC details ─────────────────────────────────────────────────────────────

/// The validation service's view of an identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NicInfo {
  #[serde(default)]
  pub valid:              bool,
  #[serde(default, deserialize_with = "lenient_year")]
  pub birth_year:         Option<i32>,
  /// `DDMMYYYY`.
  #[serde(default)]
  pub birth_day:          Option<String>,
  #[serde(default)]
  pub gender:             Option<String>,
  #[serde(default, deserialize_with = "reported_eligibility")]
  pub voting_eligibility: Option<VoteEligibility>,
  #[serde(default)]
  pub serial_number:      Option<String>,
  #[serde(default, deserialize_with = "lenient_string")]
  pub check_digit:        Option<String>,
}

/// One field on which the service and the local decoder disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
  pub field:    &'static str,
  pub local:    String,
  pub reported: String,
}

impl NicInfo {
  /// The reported gender, if it names one.
  pub fn gender(&self) -> Option<Gender> {
    self.gender.as_deref().and_then(|g| g.parse().ok())
  }

  /// Compare the reported fields with a local decoding. Fields the service
  /// left out are not compared.
  pub fn cross_check(&self, local: &DecodedIdentity) -> Vec<Mismatch> {
    let mut mismatches = Vec::new();
    let mut compare = |field: &'static str, ours: String, theirs: String| {
      if ours != theirs {
        mismatches.push(Mismatch {
          field,
          local: ours,
          reported: theirs,
        });
      }
    };

    if let Some(year) = self.birth_year {
      compare("birth_year", local.birth_year.to_string(), year.to_string());
    }
    if let Some(day) = &self.birth_day {
      let ours = format!(
        "{:02}{:02}{:04}",
        local.birth_day, local.birth_month, local.birth_year
      );
      compare("birth_day", ours, day.clone());
    }
    if let Some(gender) = &self.gender {
      compare("gender", local.gender.to_string(), gender.clone());
    }
    if let Some(serial) = &self.serial_number {
      compare("serial_number", local.serial_number.clone(), serial.clone());
    }
    if let Some(check) = &self.check_digit {
      compare("check_digit", local.check_digit.to_string(), check.clone());
    }

    mismatches
  }
}

// ─── Response envelope ───────────────────────────────────────────────────────

/// Either envelope the validation endpoint may return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValidationResponse {
  Validated {
    #[serde(rename = "NIC")]
    nic: NicInfo,
    #[serde(rename = "IP", default)]
    ip:  IpInfo,
  },
  Failed {
    error: String,
  },
}

impl ValidationResponse {
  /// Unwrap the payload, turning an error envelope into [`Error::Upstream`].
  pub fn into_result(self) -> Result<(NicInfo, IpInfo)> {
    match self {
      Self::Validated { nic, ip } => Ok((nic, ip)),
      Self::Failed { error } => Err(Error::Upstream(error)),
    }
  }
}

// ─── Lenient field decoding ──────────────────────────────────────────────────

/// The service reports eligibility as `true`, `false`, `"N/A"` or
/// `"Unknown"`; only the first three say anything.
fn reported_eligibility<'de, D>(d: D) -> Result<Option<VoteEligibility>, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(match serde_json::Value::deserialize(d)? {
    serde_json::Value::Bool(true) => Some(VoteEligibility::Eligible),
    serde_json::Value::Bool(false) => Some(VoteEligibility::NotApplicable),
    serde_json::Value::String(s) => match s.to_ascii_lowercase().as_str() {
      "n/a" | "not_applicable" | "false" => Some(VoteEligibility::NotApplicable),
      "eligible" | "true" => Some(VoteEligibility::Eligible),
      _ => None,
    },
    _ => None,
  })
}

fn lenient_year<'de, D>(d: D) -> Result<Option<i32>, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(match serde_json::Value::deserialize(d)? {
    serde_json::Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
    serde_json::Value::String(s) => s.trim().parse().ok(),
    _ => None,
  })
}

fn lenient_string<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(match serde_json::Value::deserialize(d)? {
    serde_json::Value::String(s) => Some(s),
    serde_json::Value::Number(n) => Some(n.to_string()),
    _ => None,
  })
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;
  use crate::decode::decode_identifier;

  const VALIDATED: &str = r#"{
    "NIC": {
      "valid": true,
      "birthYear": 1989,
      "birthDay": "03051989",
      "gender": "Male",
      "votingEligibility": true,
      "serialNumber": "456",
      "checkDigit": "7"
    },
    "IP": {
      "ip": "203.0.113.7",
      "city": "Colombo",
      "country": "LK",
      "loc": "6.9355,79.8487"
    }
  }"#;

  fn local() -> DecodedIdentity {
    decode_identifier("891234567V", NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
      .unwrap()
  }

  #[test]
  fn parses_validated_envelope() {
    let resp: ValidationResponse = serde_json::from_str(VALIDATED).unwrap();
    let (nic, ip) = resp.into_result().unwrap();
    assert!(nic.valid);
    assert_eq!(nic.birth_year, Some(1989));
    assert_eq!(nic.gender(), Some(Gender::Male));
    assert_eq!(nic.voting_eligibility, Some(VoteEligibility::Eligible));
    assert_eq!(ip.city.as_deref(), Some("Colombo"));
    assert_eq!(ip.coordinates(), Some((6.9355, 79.8487)));
  }

  #[test]
  fn parses_error_envelope() {
    let resp: ValidationResponse =
      serde_json::from_str(r#"{"error":"Validation failed"}"#).unwrap();
    assert_eq!(
      resp.into_result(),
      Err(Error::Upstream("Validation failed".to_string()))
    );
  }

  #[test]
  fn eligibility_labels() {
    for (raw, expected) in [
      ("true", Some(VoteEligibility::Eligible)),
      ("false", Some(VoteEligibility::NotApplicable)),
      (r#""N/A""#, Some(VoteEligibility::NotApplicable)),
      (r#""Unknown""#, None),
      ("null", None),
    ] {
      let json = format!(r#"{{"valid":true,"votingEligibility":{raw}}}"#);
      let nic: NicInfo = serde_json::from_str(&json).unwrap();
      assert_eq!(nic.voting_eligibility, expected, "for {raw}");
    }
  }

  #[test]
  fn numeric_check_digit_and_string_year() {
    let nic: NicInfo =
      serde_json::from_str(r#"{"birthYear":"2000","checkDigit":8}"#).unwrap();
    assert_eq!(nic.birth_year, Some(2000));
    assert_eq!(nic.check_digit.as_deref(), Some("8"));
  }

  #[test]
  fn cross_check_agrees_with_local_decoding() {
    let resp: ValidationResponse = serde_json::from_str(VALIDATED).unwrap();
    let (nic, _) = resp.into_result().unwrap();
    assert!(nic.cross_check(&local()).is_empty());
  }

  #[test]
  fn cross_check_reports_disagreements() {
    let nic = NicInfo {
      valid: true,
      birth_day: Some("02051989".to_string()),
      gender: Some("Female".to_string()),
      ..NicInfo::default()
    };
    let fields: Vec<_> =
      nic.cross_check(&local()).into_iter().map(|m| m.field).collect();
    assert_eq!(fields, vec!["birth_day", "gender"]);
  }

  #[test]
  fn coordinates_need_both_halves() {
    let ip = IpInfo {
      loc: Some("6.9".to_string()),
      ..IpInfo::default()
    };
    assert_eq!(ip.coordinates(), None);
  }
}
