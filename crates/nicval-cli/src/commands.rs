//! Subcommands that print to stdout instead of drawing a TUI.

use std::{
  fs::File,
  io::{self, Write},
  path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use nicval_core::{
  Batch, DecodedIdentity, VoteEligibility, decode_blocks, decode_identifier,
  decode_identifiers, extract_identifiers,
  record::{NewRecord, ValidationKind, ValidationStatus},
  validation::{IpInfo, NicInfo},
};

use crate::client::{ApiClient, RecordFilter, ServicesClient};

// ─── Input files ──────────────────────────────────────────────────────────────

fn is_csv(path: &Path) -> bool {
  path
    .extension()
    .and_then(|e| e.to_str())
    .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

/// Text blocks of one input file: CSV cells or plain-text lines.
fn read_blocks(path: &Path) -> Result<Vec<String>> {
  if is_csv(path) {
    let file =
      File::open(path).with_context(|| format!("opening {}", path.display()))?;
    nicval_csv::read_cells(file)
      .with_context(|| format!("reading CSV {}", path.display()))
  } else {
    let text = std::fs::read_to_string(path)
      .with_context(|| format!("reading {}", path.display()))?;
    Ok(nicval_csv::text_blocks(&text))
  }
}

/// Run the orchestrator over every file, in order, as one batch.
pub fn load_batch(
  files: &[PathBuf],
  column: Option<&str>,
  as_of: NaiveDate,
) -> Result<Batch> {
  match column {
    Some(column) => {
      let mut nics = Vec::new();
      for path in files {
        let file = File::open(path)
          .with_context(|| format!("opening {}", path.display()))?;
        nics.extend(
          nicval_csv::read_nic_column(file, column)
            .with_context(|| format!("reading column {column:?} of {}", path.display()))?,
        );
      }
      Ok(decode_identifiers(nics, as_of))
    }
    None => {
      let mut blocks = Vec::new();
      for path in files {
        blocks.extend(read_blocks(path)?);
      }
      Ok(decode_blocks(blocks, as_of))
    }
  }
}

// ─── decode ───────────────────────────────────────────────────────────────────

fn eligibility_label(e: Option<VoteEligibility>) -> &'static str {
  match e {
    Some(VoteEligibility::Eligible) => "Eligible",
    Some(VoteEligibility::NotApplicable) => "Not applicable",
    None => "Unknown",
  }
}

/// Human-readable description of one identity.
pub fn describe(identity: &DecodedIdentity) -> String {
  let mut lines = vec![
    format!("{:<18}{}", "NIC", identity.nic),
    format!("{:<18}{}", "Format", identity.format),
    format!("{:<18}{}", "Birth year", identity.birth_year),
    format!(
      "{:<18}{} (day {})",
      "Birth date",
      identity.birth_date_display(),
      identity.adjusted_day_of_year()
    ),
    format!("{:<18}{} on {}", "Age", identity.age, identity.as_of),
    format!("{:<18}{}", "Gender", identity.gender),
    format!(
      "{:<18}{}",
      "Voting",
      eligibility_label(identity.vote_eligibility)
    ),
    format!("{:<18}{}", "Serial number", identity.serial_number),
    format!("{:<18}{}", "Check digit", identity.check_digit),
  ];
  if identity.calendar_overflow {
    lines.push(format!(
      "{:<18}day-of-year runs past the birth year; date rolled to {}",
      "Warning", identity.birth_date
    ));
  }
  lines.join("\n")
}

pub fn decode(nic: &str, as_of: NaiveDate, json: bool) -> Result<()> {
  let identity = decode_identifier(nic, as_of)?;
  if json {
    println!("{}", serde_json::to_string_pretty(&identity)?);
  } else {
    println!("{}", describe(&identity));
  }
  Ok(())
}

// ─── extract ──────────────────────────────────────────────────────────────────

pub fn extract(path: &Path) -> Result<()> {
  let text = std::fs::read_to_string(path)
    .with_context(|| format!("reading {}", path.display()))?;
  let mut stdout = io::stdout().lock();
  for nic in extract_identifiers(&text) {
    writeln!(stdout, "{nic}")?;
  }
  Ok(())
}

// ─── batch ────────────────────────────────────────────────────────────────────

pub fn batch(
  files: &[PathBuf],
  column: Option<&str>,
  as_of: NaiveDate,
  out: Option<&Path>,
) -> Result<()> {
  let batch = load_batch(files, column, as_of)?;

  match out {
    Some(path) => {
      let file = File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
      nicval_csv::write_batch(file, &batch)?;
      eprintln!("wrote {}", path.display());
    }
    None => nicval_csv::write_batch(io::stdout().lock(), &batch)?,
  }

  eprintln!(
    "{} identifiers: {} valid, {} invalid, {} duplicates",
    batch.len(),
    batch.valid().count(),
    batch.invalid().count(),
    batch.duplicate_count()
  );
  Ok(())
}

// ─── records ──────────────────────────────────────────────────────────────────

/// Export the server's stored records as CSV.
pub async fn records(
  api: &ApiClient,
  filter: &RecordFilter,
  out: Option<&Path>,
) -> Result<()> {
  let records = api.list_records(filter).await?;

  match out {
    Some(path) => {
      let file = File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
      nicval_csv::write_records(file, &records)?;
      eprintln!("wrote {} records to {}", records.len(), path.display());
    }
    None => nicval_csv::write_records(io::stdout().lock(), &records)?,
  }
  Ok(())
}

// ─── lookup ───────────────────────────────────────────────────────────────────

/// What the external service said about an identifier.
pub enum Remote {
  Reported(NicInfo),
  Rejected(String),
  Unreachable,
}

/// Combine the local decoding with the service's verdict. A local failure
/// always wins; an unreachable service defers to the local result.
pub fn verdict(
  local: &nicval_core::Result<DecodedIdentity>,
  remote: &Remote,
) -> ValidationStatus {
  match (local, remote) {
    (Err(e), _) => ValidationStatus::Invalid {
      reason: e.to_string(),
    },
    (Ok(_), Remote::Rejected(reason)) => ValidationStatus::Invalid {
      reason: reason.clone(),
    },
    (Ok(_), Remote::Reported(info)) if !info.valid => ValidationStatus::Invalid {
      reason: "rejected by validation service".to_string(),
    },
    (Ok(_), _) => ValidationStatus::Valid,
  }
}

fn describe_location(ip: &IpInfo) -> String {
  let place: Vec<&str> = [&ip.city, &ip.region, &ip.country]
    .into_iter()
    .filter_map(|p| p.as_deref())
    .collect();
  let mut out = if place.is_empty() {
    "unknown".to_string()
  } else {
    place.join(", ")
  };
  if let Some((lat, long)) = ip.coordinates() {
    out.push_str(&format!(" ({lat:.4}, {long:.4})"));
  }
  out
}

pub async fn lookup(
  nic: &str,
  as_of: NaiveDate,
  services: &ServicesClient,
  api: Option<&ApiClient>,
) -> Result<()> {
  let local = decode_identifier(nic, as_of);
  match &local {
    Ok(identity) => println!("{}\n", describe(identity)),
    Err(e) => println!("Local decoding failed: {e}\n"),
  }

  let (remote, reported_ip) = match services.validate(nic).await {
    Ok(Ok((info, ip))) => (Remote::Reported(info), Some(ip)),
    Ok(Err(e)) => (Remote::Rejected(e.to_string()), None),
    Err(e) => {
      tracing::warn!(error = %e, "validation service unavailable");
      (Remote::Unreachable, None)
    }
  };

  match &remote {
    Remote::Reported(info) => {
      println!("Validation service: {}", if info.valid { "valid" } else { "invalid" });
      if let Ok(identity) = &local {
        let mismatches = info.cross_check(identity);
        if mismatches.is_empty() {
          println!("Cross-check: service agrees with local decoding");
        }
        for m in mismatches {
          println!(
            "Cross-check: {} differs (local {}, service {})",
            m.field, m.local, m.reported
          );
        }
      }
    }
    Remote::Rejected(reason) => println!("Validation service: {reason}"),
    Remote::Unreachable => println!("Validation service: unreachable"),
  }

  let location = match services.geolocate().await {
    Ok(ip) => Some(ip),
    Err(e) => {
      tracing::warn!(error = %e, "geolocation failed");
      reported_ip
    }
  };
  if let Some(ip) = &location {
    println!("Location: {}", describe_location(ip));
  }

  let status = verdict(&local, &remote);
  println!("Verdict: {}", if status.is_valid() { "valid" } else { "invalid" });

  if let Some(api) = api {
    let record = NewRecord {
      nic: nic.to_string(),
      status,
      kind: ValidationKind::Single,
      reported_eligibility: match &remote {
        Remote::Reported(info) => info.voting_eligibility,
        _ => None,
      },
      location,
    };
    let stored = api.create_record(&record).await?;
    println!(
      "Recorded {} (seen {} time(s))",
      stored.nic,
      stored.duplicate_count + 1
    );
  }

  Ok(())
}
