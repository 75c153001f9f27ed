//! Identifier extraction from free-form text.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
  // Old shape: nine digits and a V/X letter. New shape: twelve digits.
  // Both must sit on word boundaries so a run embedded in a longer run of
  // digits or letters is skipped.
  static ref NIC_REGEX: Regex =
    Regex::new(r"\b[0-9]{9}[VXvx]\b|\b[0-9]{12}\b").unwrap();
}

/// Lazy iterator over the identifiers found in one block of text.
///
/// Yields borrowed substrings in input order; duplicates are kept and the
/// case of the trailing letter is untouched.
pub struct Identifiers<'h> {
  inner: regex::Matches<'static, 'h>,
}

impl<'h> Iterator for Identifiers<'h> {
  type Item = &'h str;

  fn next(&mut self) -> Option<Self::Item> {
    self.inner.next().map(|m| m.as_str())
  }
}

/// Find every substring of `text` shaped like an old or new identifier.
///
/// Never fails: text without identifiers yields an empty iterator.
pub fn extract_identifiers(text: &str) -> Identifiers<'_> {
  Identifiers {
    inner: NIC_REGEX.find_iter(text),
  }
}
