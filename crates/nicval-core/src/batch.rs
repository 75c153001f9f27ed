//! Batch orchestration: extraction then decoding across many text blocks.
//!
//! Each block is one spreadsheet cell, PDF page or upload row; reading those
//! sources is the caller's job. Decode failures are kept per entry so callers
//! can report invalid identifiers alongside valid ones.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  decode::decode_identifier, extract::extract_identifiers,
  identity::DecodedIdentity,
};

// ─── Entries ─────────────────────────────────────────────────────────────────

/// What decoding one candidate produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
  Decoded(DecodedIdentity),
  Invalid { reason: String },
}

impl Outcome {
  pub fn is_decoded(&self) -> bool { matches!(self, Self::Decoded(_)) }

  pub fn identity(&self) -> Option<&DecodedIdentity> {
    match self {
      Self::Decoded(identity) => Some(identity),
      Self::Invalid { .. } => None,
    }
  }
}

/// One candidate identifier and its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchEntry {
  /// Index of the source block (or of the candidate, for
  /// [`decode_identifiers`]).
  pub block:   usize,
  /// The candidate exactly as found.
  pub raw:     String,
  pub outcome: Outcome,
}

/// How often one identifier occurred across a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
  /// Upper-cased identifier; `891234567v` and `891234567V` share a key.
  pub key:         String,
  /// Position of the first occurrence in [`Batch::entries`].
  pub first_index: usize,
  pub occurrences: usize,
}

// ─── Batch ───────────────────────────────────────────────────────────────────

/// Ordered results of one orchestration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
  /// Reference date every entry's age was computed against.
  pub as_of:   NaiveDate,
  pub entries: Vec<BatchEntry>,
}

impl Batch {
  pub fn len(&self) -> usize { self.entries.len() }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  /// Entries that decoded, in order.
  pub fn valid(&self) -> impl Iterator<Item = (&BatchEntry, &DecodedIdentity)> {
    self
      .entries
      .iter()
      .filter_map(|e| e.outcome.identity().map(|id| (e, id)))
  }

  /// Entries that failed to decode, in order.
  pub fn invalid(&self) -> impl Iterator<Item = &BatchEntry> {
    self.entries.iter().filter(|e| !e.outcome.is_decoded())
  }

  /// Occurrence counts per identifier, in first-seen order.
  pub fn tally(&self) -> Vec<Tally> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut tallies: Vec<Tally> = Vec::new();

    for (index, entry) in self.entries.iter().enumerate() {
      let key = entry.raw.to_ascii_uppercase();
      match positions.get(&key) {
        Some(&pos) => tallies[pos].occurrences += 1,
        None => {
          positions.insert(key.clone(), tallies.len());
          tallies.push(Tally {
            key,
            first_index: index,
            occurrences: 1,
          });
        }
      }
    }

    tallies
  }

  /// Number of entries that repeat an earlier identifier.
  pub fn duplicate_count(&self) -> usize {
    self.len() - self.tally().len()
  }

  fn empty(as_of: NaiveDate) -> Self {
    Self {
      as_of,
      entries: Vec::new(),
    }
  }

  fn push(&mut self, block: usize, raw: &str) {
    let outcome = match decode_identifier(raw, self.as_of) {
      Ok(identity) => Outcome::Decoded(identity),
      Err(e) => Outcome::Invalid {
        reason: e.to_string(),
      },
    };
    self.entries.push(BatchEntry {
      block,
      raw: raw.to_string(),
      outcome,
    });
  }
}

// ─── Public API ──────────────────────────────────────────────────────────────

/// Extract identifiers from every block, then decode each one.
pub fn decode_blocks<I, S>(blocks: I, as_of: NaiveDate) -> Batch
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  let mut batch = Batch::empty(as_of);
  for (block, text) in blocks.into_iter().enumerate() {
    for raw in extract_identifiers(text.as_ref()) {
      batch.push(block, raw);
    }
  }
  batch
}

/// Decode candidates that were already isolated (one identifier per item).
///
/// Surrounding whitespace is trimmed; blank items are skipped. Everything
/// else is kept, failing candidates as [`Outcome::Invalid`].
pub fn decode_identifiers<I, S>(identifiers: I, as_of: NaiveDate) -> Batch
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  let mut batch = Batch::empty(as_of);
  for (index, candidate) in identifiers.into_iter().enumerate() {
    let raw = candidate.as_ref().trim();
    if !raw.is_empty() {
      batch.push(index, raw);
    }
  }
  batch
}

#[cfg(test)]
mod tests {
  use super::*;

  fn as_of() -> NaiveDate { NaiveDate::from_ymd_opt(2024, 6, 1).unwrap() }

  #[test]
  fn blocks_keep_order_and_source_index() {
    let blocks = ["header row", "891234567V and 200012345678", "", "785011234X"];
    let batch = decode_blocks(blocks, as_of());

    let raws: Vec<_> = batch.entries.iter().map(|e| e.raw.as_str()).collect();
    assert_eq!(raws, vec!["891234567V", "200012345678", "785011234X"]);
    let sources: Vec<_> = batch.entries.iter().map(|e| e.block).collect();
    assert_eq!(sources, vec![1, 1, 3]);
    assert!(batch.entries.iter().all(|e| e.outcome.is_decoded()));
  }

  #[test]
  fn invalid_candidates_are_kept() {
    let batch = decode_identifiers(
      ["891234567V", "notanic", "  200012345678 ", "", "12345"],
      as_of(),
    );
    assert_eq!(batch.len(), 4);
    assert_eq!(batch.valid().count(), 2);

    let invalid: Vec<_> = batch.invalid().map(|e| e.raw.as_str()).collect();
    assert_eq!(invalid, vec!["notanic", "12345"]);
    assert_eq!(batch.entries[1].block, 1);
    assert_eq!(batch.entries[2].raw, "200012345678");
    let Outcome::Invalid { reason } = &batch.entries[1].outcome else {
      panic!("expected invalid outcome");
    };
    assert!(reason.contains("invalid NIC format"));
  }

  #[test]
  fn tally_merges_letter_case() {
    let batch = decode_blocks(
      ["891234567V", "200012345678 891234567v", "891234567V"],
      as_of(),
    );
    let tally = batch.tally();
    assert_eq!(tally.len(), 2);
    assert_eq!(tally[0].key, "891234567V");
    assert_eq!(tally[0].occurrences, 3);
    assert_eq!(tally[0].first_index, 0);
    assert_eq!(tally[1].key, "200012345678");
    assert_eq!(tally[1].first_index, 1);
    assert_eq!(batch.duplicate_count(), 2);
  }

  #[test]
  fn empty_input() {
    let batch = decode_blocks(Vec::<String>::new(), as_of());
    assert!(batch.is_empty());
    assert!(batch.tally().is_empty());
  }
}
