//! CSV codec for nicval.
//!
//! Reads uploaded spreadsheets into text blocks or raw identifier columns for
//! the batch orchestrator, and writes batch results and stored records as
//! report rows. Pure synchronous; no HTTP or database dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use nicval_core::decode_blocks;
//!
//! let upload = "name,nic\nAlice,891234567V\nBob,200012345678\n";
//! let cells = nicval_csv::read_cells(upload.as_bytes()).unwrap();
//! let batch = decode_blocks(&cells, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
//!
//! let mut out = Vec::new();
//! nicval_csv::write_batch(&mut out, &batch).unwrap();
//! println!("{}", String::from_utf8_lossy(&out));
//! ```

pub mod error;
mod parse;
mod serialize;

use std::io::{Read, Write};

pub use error::{Error, Result};
use nicval_core::{Batch, record::ValidationRecord};

/// Column name the server-side upload path reads identifiers from.
pub const DEFAULT_NIC_COLUMN: &str = "NIC";

// ─── Public API ──────────────────────────────────────────────────────────────

/// Every non-empty cell of a header-less CSV, row by row.
///
/// Rows may have differing lengths; each cell becomes one text block for
/// [`nicval_core::decode_blocks`].
pub fn read_cells<R: Read>(reader: R) -> Result<Vec<String>> {
  parse::read_cells(reader)
}

/// The values of `column` (matched case-insensitively) in a headed CSV.
///
/// Rows missing the column yield nothing; a header without it is an error.
pub fn read_nic_column<R: Read>(reader: R, column: &str) -> Result<Vec<String>> {
  parse::read_column(reader, column)
}

/// Split plain text into one block per non-blank line.
pub fn text_blocks(input: &str) -> Vec<String> { parse::text_blocks(input) }

/// Write one report row per batch entry, invalid entries included.
pub fn write_batch<W: Write>(writer: W, batch: &Batch) -> Result<()> {
  serialize::write_batch(writer, batch)
}

/// Write one row per stored record.
pub fn write_records<W: Write>(
  writer: W,
  records: &[ValidationRecord],
) -> Result<()> {
  serialize::write_records(writer, records)
}
