//! Readers for uploaded tabular files.

use std::io::Read;

use crate::error::{Error, Result};

pub(crate) fn read_cells<R: Read>(reader: R) -> Result<Vec<String>> {
  let mut rdr = csv::ReaderBuilder::new()
    .has_headers(false)
    .flexible(true)
    .trim(csv::Trim::All)
    .from_reader(reader);

  let mut cells = Vec::new();
  for row in rdr.records() {
    let row = row?;
    cells.extend(row.iter().filter(|c| !c.is_empty()).map(str::to_owned));
  }
  Ok(cells)
}

pub(crate) fn read_column<R: Read>(reader: R, column: &str) -> Result<Vec<String>> {
  let mut rdr = csv::ReaderBuilder::new()
    .flexible(true)
    .trim(csv::Trim::All)
    .from_reader(reader);

  let position = rdr
    .headers()?
    .iter()
    .position(|h| h.eq_ignore_ascii_case(column.trim()))
    .ok_or_else(|| Error::MissingColumn(column.to_string()))?;

  let mut values = Vec::new();
  for row in rdr.records() {
    let row = row?;
    if let Some(value) = row.get(position).filter(|v| !v.is_empty()) {
      values.push(value.to_owned());
    }
  }
  Ok(values)
}

pub(crate) fn text_blocks(input: &str) -> Vec<String> {
  input
    .lines()
    .map(str::trim)
    .filter(|l| !l.is_empty())
    .map(str::to_owned)
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn cells_from_ragged_rows() {
    let input = "name,nic\nAlice,891234567V,extra\n\nBob, 200012345678 \n";
    let cells = read_cells(input.as_bytes()).unwrap();
    assert_eq!(
      cells,
      vec!["name", "nic", "Alice", "891234567V", "extra", "Bob", "200012345678"]
    );
  }

  #[test]
  fn column_by_header_name() {
    let input = "Name,NIC\nAlice,891234567V\nBob,\nCarol,notanic\n";
    let values = read_column(input.as_bytes(), "nic").unwrap();
    assert_eq!(values, vec!["891234567V", "notanic"]);
  }

  #[test]
  fn missing_column_is_an_error() {
    let input = "Name,Phone\nAlice,0771234567\n";
    assert!(matches!(
      read_column(input.as_bytes(), "NIC"),
      Err(Error::MissingColumn(c)) if c == "NIC"
    ));
  }

  #[test]
  fn short_rows_skip_the_column() {
    let input = "Name,NIC\nAlice\nBob,200012345678\n";
    let values = read_column(input.as_bytes(), "NIC").unwrap();
    assert_eq!(values, vec!["200012345678"]);
  }

  #[test]
  fn text_blocks_drop_blank_lines() {
    assert_eq!(
      text_blocks("page one 891234567V\n\n   \npage two\r\n"),
      vec!["page one 891234567V", "page two"]
    );
  }
}
