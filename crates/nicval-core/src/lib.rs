//! Core types and pure functions for decoding national identity-card numbers.
//!
//! Extraction, decoding and batch orchestration are synchronous, stateless and
//! free of I/O. The collaborator-facing types (validation records, external
//! service responses, the [`store::RecordStore`] trait) live here too so that
//! the API, store and CLI crates share one vocabulary; this crate itself has
//! no HTTP or database dependencies.

pub mod batch;
pub mod decode;
pub mod error;
pub mod extract;
pub mod identity;
pub mod record;
pub mod stats;
pub mod store;
pub mod validation;

pub use batch::{Batch, BatchEntry, Outcome, decode_blocks, decode_identifiers};
pub use decode::decode_identifier;
pub use error::{Error, Result};
pub use extract::extract_identifiers;
pub use identity::{DecodedIdentity, Gender, IdentifierFormat, VoteEligibility};
