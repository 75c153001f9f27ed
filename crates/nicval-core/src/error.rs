//! Error types for `nicval-core`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  /// The candidate matches neither the old (9 digits + V/X) nor the new
  /// (12 digits) identifier shape.
  #[error("invalid NIC format: {0:?}")]
  InvalidFormat(String),

  /// The external validation service answered with an error payload.
  #[error("validation service error: {0}")]
  Upstream(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
