//! Error types for `gloss-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid range [{start}, {end}) for text of length {len}")]
  InvalidRange { start: usize, end: usize, len: usize },

  #[error("code {0} does not belong to the document's project")]
  InvalidReference(Uuid),

  #[error("at least one code is required to create a segment")]
  EmptyCodes,

  #[error("suggestion limit must be between 1 and 5, got {0}")]
  InvalidLimit(f64),

  #[error("name must not be blank")]
  EmptyName,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
