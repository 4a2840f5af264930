//! Error types for the suggestion provider boundary.
//!
//! Decoding itself never fails: malformed lines are skipped. Only the provider
//! call can fail, and these variants describe how.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The provider could not be reached or answered with a non-success status.
  #[error("suggestion provider unavailable: {0}")]
  Unavailable(String),

  /// The provider answered but produced no text.
  #[error("suggestion provider returned no text")]
  EmptyResponse,

  /// The provider's response envelope could not be read.
  #[error("suggestion provider returned an unreadable body: {0}")]
  InvalidBody(String),

  #[error("http client error: {0}")]
  Client(#[from] reqwest::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
