//! Documents and codes: the records that segments point into.
//!
//! Documents are immutable once created: their text length never changes, so
//! segment offsets validated at assignment time stay valid. All offsets are
//! counted in Unicode scalar values (`char`s), never in bytes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Text helpers ────────────────────────────────────────────────────────────

/// Number of `char`s in `text`.
pub fn char_len(text: &str) -> usize { text.chars().count() }

/// Byte index of the `n`th `char` of `text`, or `text.len()` when `n` is at or
/// past the end.
pub(crate) fn byte_offset(text: &str, n: usize) -> usize {
  text.char_indices().nth(n).map_or(text.len(), |(i, _)| i)
}

/// Slice `text` by half-open `char` offsets.
///
/// Returns [`Error::InvalidRange`] unless `start < end <= char_len(text)`.
pub fn slice_chars(text: &str, start: usize, end: usize) -> Result<&str> {
  let len = char_len(text);
  if start >= end || end > len {
    return Err(Error::InvalidRange { start, end, len });
  }
  let from = byte_offset(text, start);
  let to = from + byte_offset(&text[from..], end - start);
  Ok(&text[from..to])
}

// ─── Document ────────────────────────────────────────────────────────────────

/// A body of text that can be coded. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
  pub document_id: Uuid,
  pub project_id:  Uuid,
  pub name:        String,
  pub text:        String,
  pub created_at:  DateTime<Utc>,
}

impl Document {
  /// Length of the text in `char`s; the upper bound for segment offsets.
  pub fn len(&self) -> usize { char_len(&self.text) }

  pub fn is_empty(&self) -> bool { self.text.is_empty() }

  /// The text covered by `[start, end)`, validated against this document.
  pub fn slice(&self, start: usize, end: usize) -> Result<&str> {
    slice_chars(&self.text, start, end)
  }
}

/// Input to [`crate::store::RecordStore::add_document`].
#[derive(Debug, Clone)]
pub struct NewDocument {
  pub project_id: Uuid,
  pub name:       String,
  pub text:       String,
}

impl NewDocument {
  /// Trim the name and reject blank names.
  pub fn normalized(mut self) -> Result<Self> {
    self.name = non_blank(&self.name).ok_or(Error::EmptyName)?;
    Ok(self)
  }
}

// ─── Code ────────────────────────────────────────────────────────────────────

/// A qualitative-analysis label, reusable across the documents of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Code {
  pub code_id:     Uuid,
  pub project_id:  Uuid,
  pub name:        String,
  pub description: Option<String>,
  /// Display colour, free-form (e.g. `"#f59e0b"`).
  pub color:       Option<String>,
  /// Free-text labels, in the order the author gave them.
  #[serde(default)]
  pub flags:       Vec<String>,
}

/// Input to [`crate::store::RecordStore::add_code`].
#[derive(Debug, Clone)]
pub struct NewCode {
  pub project_id:  Uuid,
  pub name:        String,
  pub description: Option<String>,
  pub color:       Option<String>,
  pub flags:       Vec<String>,
}

impl NewCode {
  /// Convenience constructor with all optional fields empty.
  pub fn new(project_id: Uuid, name: impl Into<String>) -> Self {
    Self {
      project_id,
      name: name.into(),
      description: None,
      color: None,
      flags: Vec::new(),
    }
  }

  /// Trim every text field, drop blank optionals and blank flags, and reject
  /// a blank name.
  pub fn normalized(self) -> Result<Self> {
    Ok(Self {
      project_id:  self.project_id,
      name:        non_blank(&self.name).ok_or(Error::EmptyName)?,
      description: self.description.as_deref().and_then(non_blank),
      color:       self.color.as_deref().and_then(non_blank),
      flags:       normalize_flags(self.flags.iter().map(String::as_str)),
    })
  }
}

/// Input to [`crate::store::RecordStore::update_code`]. Absent fields keep
/// their current value.
#[derive(Debug, Clone, Default)]
pub struct CodeUpdate {
  /// A blank name is ignored; a code always keeps a name.
  pub name:        Option<String>,
  /// A blank value clears the description.
  pub description: Option<String>,
  /// A blank value clears the colour.
  pub color:       Option<String>,
  /// Replaces the whole flag list, normalised like [`NewCode::flags`].
  pub flags:       Option<Vec<String>>,
}

impl CodeUpdate {
  pub fn is_empty(&self) -> bool {
    self.name.is_none()
      && self.description.is_none()
      && self.color.is_none()
      && self.flags.is_none()
  }

  /// Apply the present fields to `code`.
  pub fn apply(self, mut code: Code) -> Code {
    if let Some(name) = self.name.as_deref().and_then(non_blank) {
      code.name = name;
    }
    if let Some(description) = self.description {
      code.description = non_blank(&description);
    }
    if let Some(color) = self.color {
      code.color = non_blank(&color);
    }
    if let Some(flags) = self.flags {
      code.flags = normalize_flags(flags.iter().map(String::as_str));
    }
    code
  }
}

/// Trim each flag and drop the empty ones.
pub fn normalize_flags<'a>(flags: impl IntoIterator<Item = &'a str>) -> Vec<String> {
  flags
    .into_iter()
    .map(str::trim)
    .filter(|f| !f.is_empty())
    .map(str::to_owned)
    .collect()
}

pub(crate) fn non_blank(s: &str) -> Option<String> {
  let trimmed = s.trim();
  (!trimmed.is_empty()).then(|| trimmed.to_owned())
}
