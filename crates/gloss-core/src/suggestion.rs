//! Suggestions: provider-proposed code applications for a span of text.
//!
//! Suggestions are transient: they are produced per request and never stored.
//! A [`Suggestion::New`] becomes a real code only through the normal code
//! creation path.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Suggestion {
  /// Apply a code that already exists in the project's codebook.
  Existing {
    code_id:    Uuid,
    rationale:  Option<String>,
    /// Nominally in `[0, 1]`; passed through as given.
    confidence: Option<f64>,
  },
  /// Create a new code.
  New {
    name:        String,
    description: Option<String>,
    #[serde(default)]
    flags:       Vec<String>,
    rationale:   Option<String>,
    confidence:  Option<f64>,
  },
}

impl Suggestion {
  pub fn confidence(&self) -> Option<f64> {
    match self {
      Self::Existing { confidence, .. } | Self::New { confidence, .. } => *confidence,
    }
  }

  pub fn rationale(&self) -> Option<&str> {
    match self {
      Self::Existing { rationale, .. } | Self::New { rationale, .. } => rationale.as_deref(),
    }
  }
}
